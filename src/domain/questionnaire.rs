//! Vitamin D risk questionnaire: the static question bank, the answer set a
//! respondent fills in, and the stateless wizard used to walk through it.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AnswerOption {
    pub label: &'static str,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub code: &'static str,
    pub text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<&'static str>,
    pub options: &'static [AnswerOption],
}

const fn opt(label: &'static str, score: i32) -> AnswerOption {
    AnswerOption { label, score }
}

/// Option order is significant: answers select by index.
pub static QUESTIONNAIRE: &[Question] = &[
    Question {
        code: "A1",
        text: "Typical weekday outdoor time between 10am–3pm:",
        helper: None,
        options: &[opt("≥ 30 min", 0), opt("10–29 min", 8), opt("< 10 min", 14)],
    },
    Question {
        code: "A2",
        text: "Work/study pattern:",
        helper: None,
        options: &[
            opt("Mostly outdoor", 0),
            opt("Mixed", 2),
            opt("Mostly indoor / night-shift", 6),
        ],
    },
    Question {
        code: "B",
        text: "Skin type — Fitzpatrick:",
        helper: None,
        options: &[
            opt("I–II (very fair / fair)", 0),
            opt("III–IV (medium / olive)", 8),
            opt("V–VI (dark / very dark)", 15),
        ],
    },
    Question {
        code: "C",
        text: "Location & season for the next 2–3 months:",
        helper: Some("Choose the highest that applies."),
        options: &[
            opt("QLD/NT year-round OR WA/NSW summer/spring", 0),
            opt("NSW/WA autumn/winter OR SA spring", 6),
            opt("VIC/TAS/ACT in autumn/winter", 15),
        ],
    },
    Question {
        code: "D",
        text: "Clothing coverage when outdoors:",
        helper: None,
        options: &[
            opt("Arms & lower legs exposed (short sleeves/shorts/dress)", 0),
            opt("Long sleeves OR long pants (one area covered)", 6),
            opt("Long sleeves AND long pants, head covering/veil", 10),
        ],
    },
    Question {
        code: "E1",
        text: "Vitamin D supplement (≥ 600 IU / 15 µg most days):",
        helper: None,
        options: &[opt("Yes", -10), opt("No", 0)],
    },
    Question {
        code: "E2",
        text: "Vitamin D–rich foods ≥ 4 servings/week (oily fish, fortified milk/margarine, eggs):",
        helper: None,
        options: &[opt("Yes", -5), opt("No / rare", 0)],
    },
];

const FOODS_CODE: &str = "E2";
const FOODS_NO: usize = 1;

pub fn question_count() -> usize {
    QUESTIONNAIRE.len()
}

pub fn question_by_code(code: &str) -> Option<(usize, &'static Question)> {
    QUESTIONNAIRE
        .iter()
        .enumerate()
        .find(|(_, q)| q.code.eq_ignore_ascii_case(code.trim()))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuestionnaireError {
    #[error("question index {index} out of range (questionnaire has {count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },
    #[error("option {option} is not valid for question {question} ({options} options)")]
    InvalidAnswerIndex {
        question: &'static str,
        option: usize,
        options: usize,
    },
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
}

/// One slot per question, `None` while unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<usize>>", into = "Vec<Option<usize>>")]
pub struct AnswerSet {
    slots: Vec<Option<usize>>,
}

impl Default for AnswerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerSet {
    pub fn new() -> Self {
        Self {
            slots: vec![None; QUESTIONNAIRE.len()],
        }
    }

    pub fn from_slots(slots: Vec<Option<usize>>) -> Result<Self, QuestionnaireError> {
        if slots.len() != QUESTIONNAIRE.len() {
            return Err(QuestionnaireError::AnswerCountMismatch {
                expected: QUESTIONNAIRE.len(),
                actual: slots.len(),
            });
        }
        let mut set = Self::new();
        for (index, slot) in slots.into_iter().enumerate() {
            if let Some(option) = slot {
                set.answer(index, option)?;
            }
        }
        Ok(set)
    }

    pub fn from_form(form: &QuestionnaireForm) -> Self {
        let mut set = Self::new();
        let picks = [
            ("A1", form.outdoor_time.as_deref(), OUTDOOR_SLUGS),
            ("A2", form.work_pattern.as_deref(), WORK_SLUGS),
            ("B", form.skin_type.as_deref(), SKIN_SLUGS),
            ("C", form.location.as_deref(), LOCATION_SLUGS),
            ("D", form.clothing_coverage.as_deref(), CLOTHING_SLUGS),
            ("E1", form.vitamin_d_supplement.as_deref(), YES_NO_SLUGS),
            ("E2", form.vitamin_d_foods.as_deref(), YES_NO_SLUGS),
        ];
        for (code, raw, table) in picks {
            let Some((index, _)) = question_by_code(code) else {
                continue;
            };
            set.slots[index] = raw.and_then(|value| slug_to_option(value, table));
        }
        set
    }

    pub fn answer(&mut self, index: usize, option: usize) -> Result<(), QuestionnaireError> {
        let question = QUESTIONNAIRE
            .get(index)
            .ok_or(QuestionnaireError::QuestionOutOfRange {
                index,
                count: QUESTIONNAIRE.len(),
            })?;
        if option >= question.options.len() {
            return Err(QuestionnaireError::InvalidAnswerIndex {
                question: question.code,
                option,
                options: question.options.len(),
            });
        }
        self.slots[index] = Some(option);
        Ok(())
    }

    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.slots.get(index).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered_count() == self.slots.len()
    }

    /// Only an explicit "No" on E2 counts as not eating vitamin D foods.
    pub fn eats_vitd_foods(&self) -> bool {
        question_by_code(FOODS_CODE)
            .map(|(index, _)| self.get(index) != Some(FOODS_NO))
            .unwrap_or(true)
    }
}

impl TryFrom<Vec<Option<usize>>> for AnswerSet {
    type Error = QuestionnaireError;

    fn try_from(slots: Vec<Option<usize>>) -> Result<Self, Self::Error> {
        Self::from_slots(slots)
    }
}

impl From<AnswerSet> for Vec<Option<usize>> {
    fn from(set: AnswerSet) -> Self {
        set.slots
    }
}

// Slug tables accepted by the JSON form submission.
const OUTDOOR_SLUGS: &[(&str, usize)] = &[(">30min", 0), ("≥30min", 0), ("10-29min", 1), ("<10min", 2)];
const WORK_SLUGS: &[(&str, usize)] = &[("outdoor", 0), ("mixed", 1), ("indoor", 2)];
const SKIN_SLUGS: &[(&str, usize)] = &[("i-ii", 0), ("iii-iv", 1), ("v-vi", 2)];
const LOCATION_SLUGS: &[(&str, usize)] = &[
    ("qld-nt-year-round", 0),
    ("nsw-wa-autumn-winter", 1),
    ("vic-tas-act-autumn-winter", 2),
];
const CLOTHING_SLUGS: &[(&str, usize)] = &[
    ("arms-legs-exposed", 0),
    ("one-area-covered", 1),
    ("full-coverage", 2),
];
const YES_NO_SLUGS: &[(&str, usize)] = &[("yes", 0), ("no", 1)];

fn slug_to_option(raw: &str, table: &[(&str, usize)]) -> Option<usize> {
    let needle = raw.trim().to_lowercase();
    table
        .iter()
        .find(|(slug, _)| *slug == needle)
        .map(|(_, option)| *option)
}

/// Answers submitted as slugs instead of option indices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireForm {
    pub outdoor_time: Option<String>,
    pub work_pattern: Option<String>,
    pub skin_type: Option<String>,
    pub location: Option<String>,
    pub clothing_coverage: Option<String>,
    #[serde(rename = "vitaminDSupplement")]
    pub vitamin_d_supplement: Option<String>,
    #[serde(rename = "vitaminDFoods")]
    pub vitamin_d_foods: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    Back,
    Next,
    Finish,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Step {
    Question(usize),
    Finished,
}

/// Wizard state owned by the caller between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub answers: AnswerSet,
    #[serde(default)]
    pub index: usize,
}

impl Progress {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &'static Question {
        &QUESTIONNAIRE[self.clamped_index()]
    }

    pub fn step(
        &mut self,
        action: WizardAction,
        option: Option<usize>,
    ) -> Result<Step, QuestionnaireError> {
        self.index = self.clamped_index();
        if let Some(option) = option {
            self.answers.answer(self.index, option)?;
        }

        match action {
            WizardAction::Back => {
                self.index = self.index.saturating_sub(1);
                Ok(Step::Question(self.index))
            }
            WizardAction::Next | WizardAction::Finish => {
                let next = self.index + 1;
                if next < QUESTIONNAIRE.len() {
                    self.index = next;
                    Ok(Step::Question(next))
                } else {
                    Ok(Step::Finished)
                }
            }
        }
    }

    fn clamped_index(&self) -> usize {
        self.index.min(QUESTIONNAIRE.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<_> = QUESTIONNAIRE.iter().map(|q| q.code).collect();
        assert_eq!(codes.len(), QUESTIONNAIRE.len());
        assert_eq!(question_count(), 7);
    }

    #[test]
    fn test_answer_rejects_out_of_range() {
        let mut set = AnswerSet::new();
        assert_eq!(
            set.answer(5, 2),
            Err(QuestionnaireError::InvalidAnswerIndex {
                question: "E1",
                option: 2,
                options: 2
            })
        );
        assert!(matches!(
            set.answer(7, 0),
            Err(QuestionnaireError::QuestionOutOfRange { index: 7, count: 7 })
        ));
        assert_eq!(set.answered_count(), 0);
    }

    #[test]
    fn test_from_slots_checks_length() {
        let err = AnswerSet::from_slots(vec![Some(0); 3]).unwrap_err();
        assert_eq!(
            err,
            QuestionnaireError::AnswerCountMismatch {
                expected: 7,
                actual: 3
            }
        );

        let set = AnswerSet::from_slots(vec![Some(2), None, Some(1), None, Some(0), Some(1), Some(0)])
            .unwrap();
        assert_eq!(set.get(0), Some(2));
        assert_eq!(set.get(1), None);
        assert!(set.eats_vitd_foods());
        assert!(!set.is_complete());
    }

    #[test]
    fn test_form_slugs_map_to_indices() {
        let form: QuestionnaireForm = serde_json::from_value(serde_json::json!({
            "outdoorTime": "<10min",
            "workPattern": "Indoor",
            "skinType": "III-IV",
            "location": "VIC-TAS-ACT-autumn-winter",
            "clothingCoverage": "full-coverage",
            "vitaminDSupplement": "no",
            "vitaminDFoods": "nonsense"
        }))
        .unwrap();

        let set = AnswerSet::from_form(&form);
        assert_eq!(
            set.slots(),
            &[Some(2), Some(2), Some(1), Some(2), Some(2), Some(1), None]
        );
        assert!(set.eats_vitd_foods());
    }

    #[test]
    fn test_wizard_walks_forward_and_back() {
        let mut progress = Progress::start();
        assert_eq!(progress.current().code, "A1");

        assert_eq!(progress.step(WizardAction::Next, Some(1)).unwrap(), Step::Question(1));
        assert_eq!(progress.step(WizardAction::Back, None).unwrap(), Step::Question(0));
        assert_eq!(progress.step(WizardAction::Back, None).unwrap(), Step::Question(0));
        assert_eq!(progress.answers.get(0), Some(1));

        progress.index = 42;
        assert_eq!(progress.step(WizardAction::Finish, Some(0)).unwrap(), Step::Finished);
        assert_eq!(progress.index, 6);
        assert!(progress.answers.eats_vitd_foods());
    }

    #[test]
    fn test_wizard_keeps_state_on_bad_option() {
        let mut progress = Progress::start();
        assert!(progress.step(WizardAction::Next, Some(9)).is_err());
        assert_eq!(progress.index, 0);
        assert_eq!(progress.answers.answered_count(), 0);
    }

    #[test]
    fn test_answer_set_deserializes_with_validation() {
        let ok: AnswerSet = serde_json::from_str("[0,null,null,null,null,null,1]").unwrap();
        assert_eq!(ok.answered_count(), 2);
        assert!(serde_json::from_str::<AnswerSet>("[0,5,null,null,null,null,1]").is_err());
    }

    #[test]
    fn test_clear_unanswers_slot() {
        let mut set = AnswerSet::from_slots(vec![Some(1); 7]).unwrap();
        assert!(set.is_complete());
        set.clear(3);
        set.clear(42);
        assert_eq!(set.get(3), None);
        assert_eq!(set.get(2), Some(1));
        assert!(!set.is_complete());
    }

    #[test]
    fn test_unanswered_foods_counts_as_eating() {
        let mut set = AnswerSet::new();
        assert!(set.eats_vitd_foods());
        set.answer(6, 0).unwrap();
        assert!(set.eats_vitd_foods());
        set.answer(6, 1).unwrap();
        assert!(!set.eats_vitd_foods());
        set.clear(6);
        assert!(set.eats_vitd_foods());
    }
}
