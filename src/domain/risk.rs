use crate::domain::questionnaire::{AnswerSet, QUESTIONNAIRE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RiskError {
    #[error("answer {option} is out of range for question {question}")]
    InvalidAnswerIndex { question: usize, option: usize },
    #[error("{actual} answers supplied but the questionnaire has {expected} questions")]
    TooManyAnswers { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Classification {
    Adequate,
    Borderline,
    Inadequate,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Adequate => "Adequate",
            Classification::Borderline => "Borderline",
            Classification::Inadequate => "Inadequate",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sum of the selected option deltas, floored at zero.
///
/// Missing trailing slots count as unanswered.
pub fn score(answers: &[Option<usize>]) -> Result<i32, RiskError> {
    if answers.len() > QUESTIONNAIRE.len() {
        return Err(RiskError::TooManyAnswers {
            expected: QUESTIONNAIRE.len(),
            actual: answers.len(),
        });
    }

    let mut total = 0;
    for (question, (slot, q)) in answers.iter().zip(QUESTIONNAIRE).enumerate() {
        let Some(option) = *slot else { continue };
        let picked = q
            .options
            .get(option)
            .ok_or(RiskError::InvalidAnswerIndex { question, option })?;
        total += picked.score;
    }
    Ok(total.max(0))
}

impl AnswerSet {
    pub fn score(&self) -> i32 {
        // Slots are validated on construction.
        score(self.slots()).unwrap_or(0)
    }
}

/// Two scoring variants exist: a three-band one and the binary split used by
/// the JSON submission flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierPolicy {
    Tiered { low_cutoff: i32, high_cutoff: i32 },
    Binary { cutoff: i32 },
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        ClassifierPolicy::Tiered {
            low_cutoff: 15,
            high_cutoff: 35,
        }
    }
}

impl ClassifierPolicy {
    pub fn classify(&self, score: i32) -> Classification {
        match *self {
            ClassifierPolicy::Tiered {
                low_cutoff,
                high_cutoff,
            } => {
                if score <= low_cutoff {
                    Classification::Adequate
                } else if score <= high_cutoff {
                    Classification::Borderline
                } else {
                    Classification::Inadequate
                }
            }
            ClassifierPolicy::Binary { cutoff } => {
                if score >= cutoff {
                    Classification::Inadequate
                } else {
                    Classification::Adequate
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid classifier policy {0:?} (expected tiered:<low>:<high> or binary:<cutoff>)")]
pub struct PolicyParseError(pub String);

impl FromStr for ClassifierPolicy {
    type Err = PolicyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || PolicyParseError(raw.to_string());
        let parts: Vec<&str> = raw.trim().split(':').map(str::trim).collect();
        match parts.as_slice() {
            [kind, low, high] if kind.eq_ignore_ascii_case("tiered") => {
                let low_cutoff: i32 = low.parse().map_err(|_| err())?;
                let high_cutoff: i32 = high.parse().map_err(|_| err())?;
                if low_cutoff > high_cutoff {
                    return Err(err());
                }
                Ok(ClassifierPolicy::Tiered {
                    low_cutoff,
                    high_cutoff,
                })
            }
            [kind, cutoff] if kind.eq_ignore_ascii_case("binary") => Ok(ClassifierPolicy::Binary {
                cutoff: cutoff.parse().map_err(|_| err())?,
            }),
            _ => Err(err()),
        }
    }
}

/// Classification under the default three-band policy.
#[allow(dead_code)]
pub fn classify(score: i32) -> Classification {
    ClassifierPolicy::default().classify(score)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RiskAssessment {
    pub score: i32,
    pub classification: Classification,
}

pub fn assess(answers: &[Option<usize>], policy: ClassifierPolicy) -> Result<RiskAssessment, RiskError> {
    let score = score(answers)?;
    Ok(RiskAssessment {
        score,
        classification: policy.classify(score),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanswered_scores_zero() {
        let answers = vec![None; QUESTIONNAIRE.len()];
        assert_eq!(score(&answers).unwrap(), 0);
        assert_eq!(classify(0), Classification::Adequate);
        assert_eq!(score(&[]).unwrap(), 0);
    }

    #[test]
    fn test_worst_case_sum() {
        let answers = [Some(2), Some(2), Some(2), Some(2), Some(2), Some(1), Some(1)];
        assert_eq!(score(&answers).unwrap(), 14 + 6 + 15 + 15 + 10);
        assert_eq!(classify(60), Classification::Inadequate);
    }

    #[test]
    fn test_negative_deltas_floor_at_zero() {
        let answers = [Some(0), Some(0), Some(0), Some(0), Some(0), Some(0), Some(0)];
        assert_eq!(score(&answers).unwrap(), 0);

        let answers = [Some(1), None, None, None, None, Some(0), None];
        assert_eq!(score(&answers).unwrap(), 0);
    }

    #[test]
    fn test_invalid_index_fails_fast() {
        let answers = [Some(0), Some(3), None, None, None, None, None];
        assert_eq!(
            score(&answers),
            Err(RiskError::InvalidAnswerIndex {
                question: 1,
                option: 3
            })
        );
        assert!(matches!(
            score(&[None; 8]),
            Err(RiskError::TooManyAnswers { expected: 7, actual: 8 })
        ));
    }

    #[test]
    fn test_score_monotonic_in_each_answer() {
        let base = [Some(1), Some(1), Some(0), Some(1), Some(0), Some(1), Some(1)];
        let base_score = score(&base).unwrap();
        for (q, question) in QUESTIONNAIRE.iter().enumerate() {
            let current = base[q].unwrap();
            for higher in 0..question.options.len() {
                if question.options[higher].score < question.options[current].score {
                    continue;
                }
                let mut changed = base;
                changed[q] = Some(higher);
                assert!(score(&changed).unwrap() >= base_score, "question {}", question.code);
            }
        }
    }

    #[test]
    fn test_tiered_boundaries() {
        assert_eq!(classify(15), Classification::Adequate);
        assert_eq!(classify(16), Classification::Borderline);
        assert_eq!(classify(35), Classification::Borderline);
        assert_eq!(classify(36), Classification::Inadequate);
    }

    #[test]
    fn test_binary_policy() {
        let policy = ClassifierPolicy::Binary { cutoff: 35 };
        assert_eq!(policy.classify(34), Classification::Adequate);
        assert_eq!(policy.classify(35), Classification::Inadequate);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("tiered:15:35".parse::<ClassifierPolicy>(), Ok(ClassifierPolicy::default()));
        assert_eq!(
            " Binary : 35 ".parse::<ClassifierPolicy>(),
            Ok(ClassifierPolicy::Binary { cutoff: 35 })
        );
        assert!("tiered:40:10".parse::<ClassifierPolicy>().is_err());
        assert!("ternary".parse::<ClassifierPolicy>().is_err());
    }

    #[test]
    fn test_assess_uses_policy() {
        let answers = [Some(2), Some(2), Some(1), None, None, None, None];
        let tiered = assess(&answers, ClassifierPolicy::default()).unwrap();
        assert_eq!(tiered.score, 28);
        assert_eq!(tiered.classification, Classification::Borderline);

        let binary = assess(&answers, ClassifierPolicy::Binary { cutoff: 35 }).unwrap();
        assert_eq!(binary.classification, Classification::Adequate);
    }
}
