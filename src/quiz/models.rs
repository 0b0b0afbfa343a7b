use core::fmt;

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::engine::error::QuizError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Random,
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Random => "random",
        }
    }

    /// Query parameter value, `None` when the upstream should pick freely.
    pub fn as_param(&self) -> Option<&str> {
        match self {
            Difficulty::Random => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Multiple,
    Boolean,
    Random,
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Multiple => "multiple",
            QuestionType::Boolean => "boolean",
            QuestionType::Random => "random",
        }
    }

    pub fn as_param(&self) -> Option<&str> {
        match self {
            QuestionType::Random => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category selection, either a concrete upstream id or "random".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    Any,
    Id(u32),
}

impl Serialize for CategoryFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CategoryFilter::Any => serializer.serialize_str("random"),
            CategoryFilter::Id(id) => serializer.serialize_u32(*id),
        }
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    // Stored records carry either "random", a number, or a numeric string.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = CategoryFilter;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("\"random\", a category id, or a numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CategoryFilter, E> {
                Ok(CategoryFilter::Id(v as u32))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CategoryFilter, E> {
                Ok(CategoryFilter::Id(v as u32))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CategoryFilter, E> {
                if v == "random" {
                    return Ok(CategoryFilter::Any);
                }
                v.parse().map(CategoryFilter::Id).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Immutable once a session starts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct QuizOptions {
    pub category: CategoryFilter,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub timer_seconds: u32,
    pub question_count: u8,
}

impl QuizOptions {
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.question_count == 0 {
            return Err(QuizError::InvalidOptions("question count must be positive"));
        }
        if self.timer_seconds == 0 {
            return Err(QuizError::InvalidOptions("timer must be positive"));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

/// Upstream wire record. All text arrives HTML-escaped.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawQuestion {
    #[serde(rename = "type")]
    pub question_type: String,
    pub difficulty: String,
    pub category: String,
    pub question: String,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}

/// Decoded, answer-shuffled question as held by a session. The shuffled
/// order is fixed at creation and never changes for the life of the
/// question; `is_correct` is set by exactly one answer check.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DisplayQuestion {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub shuffled_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(rename = "type")]
    pub question_type: String,
    pub difficulty: String,
    pub category: String,
}

impl DisplayQuestion {
    pub fn from_raw(raw: RawQuestion) -> Self {
        let question = decode(&raw.question);
        let correct_answer = decode(&raw.correct_answer);
        let incorrect_answers: Vec<String> =
            raw.incorrect_answers.iter().map(|a| decode(a)).collect();

        let mut shuffled_answers = incorrect_answers.clone();
        shuffled_answers.push(correct_answer.clone());
        let mut rng = ChaCha8Rng::from_os_rng();
        shuffled_answers.shuffle(&mut rng);

        Self {
            question,
            correct_answer,
            incorrect_answers,
            shuffled_answers,
            is_correct: None,
            question_type: raw.question_type,
            difficulty: raw.difficulty,
            category: decode(&raw.category),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.is_correct.is_some()
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// The persisted, resumable state of one in-progress quiz.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QuizSession {
    pub questions: Vec<DisplayQuestion>,
    pub remaining_seconds: u32,
}

impl QuizSession {
    pub fn new(questions: Vec<DisplayQuestion>, remaining_seconds: u32) -> Self {
        Self {
            questions,
            remaining_seconds,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats::from_questions(&self.questions)
    }
}

/// Derived aggregate counts, recomputed from the questions on demand and
/// never persisted.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub answered: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub percentage: u32,
}

impl Stats {
    pub fn from_questions(questions: &[DisplayQuestion]) -> Self {
        let total = questions.len();
        let correct = questions
            .iter()
            .filter(|q| q.is_correct == Some(true))
            .count();
        let incorrect = questions
            .iter()
            .filter(|q| q.is_correct == Some(false))
            .count();
        let answered = correct + incorrect;

        let percentage = if total == 0 {
            0
        } else {
            ((correct * 100) as f64 / total as f64).round() as u32
        };

        Self {
            answered,
            correct,
            incorrect,
            unanswered: total - answered,
            percentage,
        }
    }
}
