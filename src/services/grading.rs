//! Deterministic scoring of normalized answers against an exam's questions.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{AnswerDetail, AnswerValue, Question, QuestionBody, TRUE_FALSE_OPTIONS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub details: Vec<AnswerDetail>,
    pub score: u32,
    pub total: u32,
    /// `None` when nothing was scored.
    pub percent: Option<f64>,
}

/// The answer key for one scored question, resolved to option texts.
enum AnswerKey<'a> {
    Single(&'a str),
    Set(BTreeSet<&'a str>),
}

#[derive(Debug, Clone, Copy)]
pub struct GradingEngine {
    points_per_question: u32,
    disclose_correct: bool,
}

impl GradingEngine {
    pub fn new(points_per_question: u32, disclose_correct: bool) -> Self {
        Self { points_per_question, disclose_correct }
    }

    /// Grades `answers` index by index against `questions`. A missing answer
    /// counts as empty; a scored question with a broken answer key is
    /// reported as ungraded and left out of the total.
    pub fn grade(&self, questions: &[Question], answers: &[AnswerValue]) -> GradeReport {
        let mut details = Vec::with_capacity(questions.len());
        let mut score = 0u32;
        let mut total = 0u32;

        for (index, question) in questions.iter().enumerate() {
            let user_value = answers.get(index).cloned().unwrap_or_else(|| empty_for(question));

            let key = if question.scored { answer_key(question) } else { None };
            let Some(key) = key else {
                if question.scored {
                    tracing::warn!(index, title = %question.title, "Scored question has a malformed answer key; leaving it ungraded");
                }
                details.push(AnswerDetail { index, is_correct: None, user_value, correct_value: None });
                continue;
            };

            total = total.saturating_add(self.points_per_question);
            let is_correct = match (&key, &user_value) {
                (AnswerKey::Single(expected), AnswerValue::Single(given)) => given == expected,
                (AnswerKey::Set(expected), AnswerValue::Many(given)) => {
                    given.iter().map(String::as_str).collect::<BTreeSet<_>>() == *expected
                }
                _ => false,
            };
            if is_correct {
                score = score.saturating_add(self.points_per_question);
            }

            let correct_value = self.disclose_correct.then(|| match &key {
                AnswerKey::Single(expected) => AnswerValue::Single(expected.to_string()),
                AnswerKey::Set(expected) => {
                    AnswerValue::Many(expected.iter().map(|item| item.to_string()).collect())
                }
            });

            details.push(AnswerDetail { index, is_correct: Some(is_correct), user_value, correct_value });
        }

        GradeReport { details, score, total, percent: percent(score, total) }
    }
}

pub fn percent(score: u32, total: u32) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let raw = f64::from(score) * 100.0 / f64::from(total);
    Some((raw * 100.0).round() / 100.0)
}

fn empty_for(question: &Question) -> AnswerValue {
    match question.body {
        QuestionBody::Check { .. } => AnswerValue::Many(Vec::new()),
        _ => AnswerValue::empty_single(),
    }
}

fn answer_key(question: &Question) -> Option<AnswerKey<'_>> {
    match &question.body {
        QuestionBody::Text => None,
        QuestionBody::Multiple { options, correct } => {
            let option = options.get((*correct)?)?;
            (!option.is_empty()).then_some(AnswerKey::Single(option.as_str()))
        }
        QuestionBody::TrueFalse { correct } => {
            TRUE_FALSE_OPTIONS.get((*correct)?).map(|option| AnswerKey::Single(*option))
        }
        QuestionBody::Check { options, correct } => {
            let indices = correct.as_ref().filter(|indices| !indices.is_empty())?;
            let set = indices
                .iter()
                .map(|index| options.get(*index).map(String::as_str))
                .collect::<Option<BTreeSet<_>>>()?;
            Some(AnswerKey::Set(set))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple(options: &[&str], correct: Option<usize>) -> Question {
        Question {
            title: "Pick one".into(),
            scored: true,
            body: QuestionBody::Multiple {
                options: options.iter().map(|o| o.to_string()).collect(),
                correct,
            },
        }
    }

    fn check(options: &[&str], correct: Option<Vec<usize>>) -> Question {
        Question {
            title: "Pick many".into(),
            scored: true,
            body: QuestionBody::Check { options: options.iter().map(|o| o.to_string()).collect(), correct },
        }
    }

    fn single(value: &str) -> AnswerValue {
        AnswerValue::Single(value.to_string())
    }

    fn many(values: &[&str]) -> AnswerValue {
        AnswerValue::Many(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn multiple_correct_answer_scores_full_points() {
        let engine = GradingEngine::new(5, false);
        let report = engine.grade(&[multiple(&["A", "B", "C"], Some(1))], &[single("B")]);
        assert_eq!((report.score, report.total, report.percent), (5, 5, Some(100.0)));
        assert_eq!(report.details[0].is_correct, Some(true));
    }

    #[test]
    fn multiple_wrong_answer_scores_zero() {
        let engine = GradingEngine::new(5, false);
        let report = engine.grade(&[multiple(&["A", "B", "C"], Some(1))], &[single("C")]);
        assert_eq!((report.score, report.total, report.percent), (0, 5, Some(0.0)));
        assert_eq!(report.details[0].is_correct, Some(false));
    }

    #[test]
    fn check_requires_exact_set() {
        let engine = GradingEngine::new(1, false);
        let question = check(&["X", "Y", "Z"], Some(vec![0, 2]));

        let cases = [
            (many(&["Z", "X"]), true),
            (many(&["Z"]), false),
            (many(&["X", "Y", "Z"]), false),
            (many(&[]), false),
        ];
        for (answer, expected) in cases {
            let report = engine.grade(std::slice::from_ref(&question), &[answer]);
            assert_eq!(report.details[0].is_correct, Some(expected));
            assert_eq!(report.total, 1);
        }
    }

    #[test]
    fn unscored_questions_are_ungraded() {
        let engine = GradingEngine::new(5, true);
        let questions = vec![
            Question { title: "Comments".into(), scored: false, body: QuestionBody::Text },
            multiple(&["Yes", "No"], None).unscored(),
        ];
        let report = engine.grade(&questions, &[single("fine"), single("Yes")]);

        assert_eq!((report.score, report.total, report.percent), (0, 0, None));
        assert!(report.details.iter().all(|d| d.is_correct.is_none() && d.correct_value.is_none()));
    }

    #[test]
    fn malformed_answer_keys_degrade_to_ungraded() {
        let engine = GradingEngine::new(2, false);
        let questions = vec![
            multiple(&["A", "B"], Some(7)),
            multiple(&["A", "B"], None),
            check(&["A", "B"], Some(vec![])),
            check(&["A", "B"], Some(vec![0, 5])),
            Question { title: "TF".into(), scored: true, body: QuestionBody::TrueFalse { correct: Some(3) } },
            multiple(&["A", "B"], Some(0)),
        ];
        let answers = vec![single("A"), single("A"), many(&["A"]), many(&["A"]), single("TRUE"), single("A")];

        let report = engine.grade(&questions, &answers);
        let verdicts: Vec<Option<bool>> = report.details.iter().map(|d| d.is_correct).collect();
        assert_eq!(verdicts, vec![None, None, None, None, None, Some(true)]);
        assert_eq!((report.score, report.total), (2, 2));
    }

    #[test]
    fn true_false_compares_option_text() {
        let engine = GradingEngine::new(1, true);
        let question = Question {
            title: "Water is wet".into(),
            scored: true,
            body: QuestionBody::TrueFalse { correct: Some(0) },
        };
        let report = engine.grade(std::slice::from_ref(&question), &[single("TRUE")]);
        assert_eq!(report.details[0].is_correct, Some(true));
        assert_eq!(report.details[0].correct_value, Some(single("TRUE")));

        let report = engine.grade(&[question], &[single("0")]);
        assert_eq!(report.details[0].is_correct, Some(false));
    }

    #[test]
    fn shape_mismatch_is_incorrect_not_ungraded() {
        let engine = GradingEngine::new(1, false);
        let report = engine.grade(&[check(&["X", "Y"], Some(vec![0]))], &[single("X")]);
        assert_eq!(report.details[0].is_correct, Some(false));
    }

    #[test]
    fn percent_rounds_to_two_places() {
        assert_eq!(percent(1, 3), Some(33.33));
        assert_eq!(percent(2, 3), Some(66.67));
        assert_eq!(percent(0, 0), None);
    }

    #[test]
    fn score_never_exceeds_total() {
        let engine = GradingEngine::new(3, false);
        let questions = vec![
            multiple(&["A", "B"], Some(0)),
            check(&["A", "B"], Some(vec![1])),
            Question { title: "Why".into(), scored: false, body: QuestionBody::Text },
        ];
        let answers = vec![single("A"), many(&["B"]), single("because")];
        let report = engine.grade(&questions, &answers);
        assert_eq!((report.score, report.total), (6, 6));
        assert!(report.score <= report.total);
    }

    #[test]
    fn huge_point_values_saturate_instead_of_overflowing() {
        let engine = GradingEngine::new(u32::MAX / 2 + 1, false);
        let question = Question {
            title: "Sky is blue".into(),
            scored: true,
            body: QuestionBody::TrueFalse { correct: Some(0) },
        };
        let questions = vec![question.clone(), question.clone(), question];
        let answers = vec![single("TRUE"), single("FALSE"), single("TRUE")];

        let report = engine.grade(&questions, &answers);
        assert_eq!(report.total, u32::MAX);
        assert_eq!(report.score, u32::MAX);
        assert!(report.score <= report.total);
    }
}
