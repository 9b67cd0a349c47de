//! Fixed-slot storage encoding for template questions and form answers.
//!
//! A template row stores its questions in `SLOTS_PER_TYPE` named slots per
//! type tag, and a form row stores its answers the same way. Field names
//! follow `custom<Type><Index><Field>`, e.g. `customInt2Answer`.
//!
//! - Encoding keeps the first `SLOTS_PER_TYPE` entries of each type and
//!   silently drops the rest.
//! - Decoding walks the types in `TypeTag::ALL` order and indices `1..=4`,
//!   skipping unset slots, so the result is grouped by type rather than in
//!   authoring order.
//! - Merging pairs the n-th question of a type with the n-th answer of the
//!   same type.

use formstack_models::{Answer, MergedEntry, Question, TypeTag, SLOTS_PER_TYPE};
use serde_json::{Map, Value};

/// Flat slot-name → value mapping, the shape a template or form row is stored in.
pub type SlotRow = Map<String, Value>;

/// Presence marker stored in each question slot's `State` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    PresentRequired,
    NotPresent,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::PresentRequired => "PRESENT_REQUIRED",
            SlotState::NotPresent => "NOT_PRESENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRESENT_REQUIRED" => Some(SlotState::PresentRequired),
            "NOT_PRESENT" => Some(SlotState::NotPresent),
            _ => None,
        }
    }
}

/// Which part of a slot a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Question,
    Description,
    State,
    Answer,
}

impl SlotField {
    /// Fields stored on a template row, per slot.
    pub const QUESTION_FIELDS: [SlotField; 3] =
        [SlotField::Question, SlotField::Description, SlotField::State];

    pub fn suffix(&self) -> &'static str {
        match self {
            SlotField::Question => "Question",
            SlotField::Description => "Description",
            SlotField::State => "State",
            SlotField::Answer => "Answer",
        }
    }
}

/// A single storage column: one field of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotColumn {
    pub name: String,
    pub tag: TypeTag,
    pub field: SlotField,
}

/// Storage name of a slot field; `index` is 1-based.
pub fn slot_field(tag: TypeTag, index: usize, field: SlotField) -> String {
    format!("custom{}{}{}", tag.canonical(), index, field.suffix())
}

/// Every question column of a template row, in storage order.
pub fn question_columns() -> Vec<SlotColumn> {
    let mut columns = Vec::new();
    for tag in TypeTag::ALL {
        for index in 1..=SLOTS_PER_TYPE {
            for field in SlotField::QUESTION_FIELDS {
                columns.push(SlotColumn {
                    name: slot_field(tag, index, field),
                    tag,
                    field,
                });
            }
        }
    }
    columns
}

/// Every answer column of a form row, in storage order.
pub fn answer_columns() -> Vec<SlotColumn> {
    let mut columns = Vec::new();
    for tag in TypeTag::ALL {
        for index in 1..=SLOTS_PER_TYPE {
            columns.push(SlotColumn {
                name: slot_field(tag, index, SlotField::Answer),
                tag,
                field: SlotField::Answer,
            });
        }
    }
    columns
}

/// Encodes the questions of type `tag` into their slots.
pub fn encode_questions(entries: &[Question], tag: TypeTag) -> SlotRow {
    let mut row = SlotRow::new();
    let matching = entries.iter().filter(|q| q.kind == tag).take(SLOTS_PER_TYPE);

    for (position, question) in matching.enumerate() {
        let index = position + 1;
        row.insert(
            slot_field(tag, index, SlotField::Question),
            Value::String(question.question.clone()),
        );
        row.insert(
            slot_field(tag, index, SlotField::Description),
            Value::String(question.description.clone()),
        );
        row.insert(
            slot_field(tag, index, SlotField::State),
            Value::String(SlotState::PresentRequired.as_str().to_string()),
        );
    }

    row
}

/// Encodes the answers of type `tag` into their slots.
pub fn encode_answers(entries: &[Answer], tag: TypeTag) -> SlotRow {
    let mut row = SlotRow::new();
    let matching = entries.iter().filter(|a| a.kind == tag).take(SLOTS_PER_TYPE);

    for (position, answer) in matching.enumerate() {
        row.insert(
            slot_field(tag, position + 1, SlotField::Answer),
            answer.answer.clone(),
        );
    }

    row
}

/// Encodes a whole question list into one template row.
pub fn encode_question_row(entries: &[Question]) -> SlotRow {
    let mut row = SlotRow::new();
    for tag in TypeTag::ALL {
        row.extend(encode_questions(entries, tag));
    }
    row
}

/// Encodes a whole answer list into one form row.
pub fn encode_answer_row(entries: &[Answer]) -> SlotRow {
    let mut row = SlotRow::new();
    for tag in TypeTag::ALL {
        row.extend(encode_answers(entries, tag));
    }
    row
}

/// Rebuilds the question list from a template row.
pub fn decode_questions(row: &SlotRow) -> Vec<Question> {
    let mut questions = Vec::new();

    for tag in TypeTag::ALL {
        for index in 1..=SLOTS_PER_TYPE {
            let state = row
                .get(&slot_field(tag, index, SlotField::State))
                .and_then(Value::as_str)
                .and_then(SlotState::parse);
            if state != Some(SlotState::PresentRequired) {
                continue;
            }

            questions.push(Question {
                kind: tag,
                question: text_field(row, tag, index, SlotField::Question),
                description: text_field(row, tag, index, SlotField::Description),
            });
        }
    }

    questions
}

/// Rebuilds the answer list from a form row.
pub fn decode_answers(row: &SlotRow) -> Vec<Answer> {
    let mut answers = Vec::new();

    for tag in TypeTag::ALL {
        for index in 1..=SLOTS_PER_TYPE {
            match row.get(&slot_field(tag, index, SlotField::Answer)) {
                None | Some(Value::Null) => continue,
                Some(value) => answers.push(Answer {
                    kind: tag,
                    answer: value.clone(),
                }),
            }
        }
    }

    answers
}

/// Pairs each question with the answer at the same position within its type.
/// Unanswered questions get `null`; answers without a question are dropped.
pub fn merge(questions: &[Question], answers: &[Answer]) -> Vec<MergedEntry> {
    let mut merged = Vec::with_capacity(questions.len());

    for tag in TypeTag::ALL {
        let mut tag_answers = answers.iter().filter(|a| a.kind == tag);

        for question in questions.iter().filter(|q| q.kind == tag) {
            let answer = tag_answers
                .next()
                .map(|a| a.answer.clone())
                .unwrap_or(Value::Null);

            merged.push(MergedEntry {
                kind: tag,
                question: question.question.clone(),
                description: question.description.clone(),
                answer,
            });
        }
    }

    merged
}

/// Type tags that have more entries than there are slots for them.
pub fn overflowing_tags<'a, I>(kinds: I) -> Vec<TypeTag>
where
    I: IntoIterator<Item = &'a TypeTag>,
{
    let mut counts = [0usize; 4];
    for kind in kinds {
        if let Some(position) = TypeTag::ALL.iter().position(|t| t == kind) {
            counts[position] += 1;
        }
    }

    TypeTag::ALL
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > SLOTS_PER_TYPE)
        .map(|(tag, _)| *tag)
        .collect()
}

fn text_field(row: &SlotRow, tag: TypeTag, index: usize, field: SlotField) -> String {
    row.get(&slot_field(tag, index, field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstack_models::TOTAL_SLOTS;
    use serde_json::json;

    fn q(kind: TypeTag, question: &str) -> Question {
        Question::new(kind, question, format!("{question} description"))
    }

    #[test]
    fn test_field_naming() {
        assert_eq!(
            slot_field(TypeTag::String, 1, SlotField::Question),
            "customString1Question"
        );
        assert_eq!(slot_field(TypeTag::Int, 2, SlotField::Answer), "customInt2Answer");
        assert_eq!(slot_field(TypeTag::Bool, 4, SlotField::State), "customBool4State");
        assert_eq!(question_columns().len(), TOTAL_SLOTS * 3);
        assert_eq!(answer_columns().len(), TOTAL_SLOTS);
    }

    #[test]
    fn test_encode_single_type() {
        let entries = vec![
            q(TypeTag::Int, "Age"),
            q(TypeTag::String, "Name"),
            q(TypeTag::Int, "Height"),
        ];

        let row = encode_questions(&entries, TypeTag::Int);

        assert_eq!(row.len(), 6);
        assert_eq!(row["customInt1Question"], "Age");
        assert_eq!(row["customInt2Question"], "Height");
        assert_eq!(row["customInt2State"], "PRESENT_REQUIRED");
        assert!(!row.contains_key("customInt3State"));
        assert!(!row.contains_key("customString1Question"));
    }

    #[test]
    fn test_question_round_trip() {
        let entries = vec![
            q(TypeTag::Text, "Bio"),
            q(TypeTag::String, "Name"),
            q(TypeTag::Bool, "Subscribed"),
            q(TypeTag::String, "City"),
            q(TypeTag::Int, "Age"),
        ];

        let decoded = decode_questions(&encode_question_row(&entries));

        // Grouped by type order, authoring order kept within each type
        assert_eq!(
            decoded,
            vec![
                q(TypeTag::String, "Name"),
                q(TypeTag::String, "City"),
                q(TypeTag::Int, "Age"),
                q(TypeTag::Text, "Bio"),
                q(TypeTag::Bool, "Subscribed"),
            ]
        );
    }

    #[test]
    fn test_full_capacity_round_trip() {
        let mut entries = Vec::new();
        for tag in TypeTag::ALL {
            for i in 0..SLOTS_PER_TYPE {
                entries.push(q(tag, &format!("{}-{i}", tag.as_str())));
            }
        }

        let row = encode_question_row(&entries);
        assert_eq!(row.len(), TOTAL_SLOTS * 3);
        assert_eq!(decode_questions(&row), entries);
    }

    #[test]
    fn test_fifth_entry_is_silently_dropped() {
        let entries: Vec<Question> = (1..=5)
            .map(|i| q(TypeTag::Int, &format!("Q{i}")))
            .collect();

        let decoded = decode_questions(&encode_question_row(&entries));

        assert_eq!(decoded.len(), 4);
        assert!(decoded.iter().all(|d| d.question != "Q5"));
        assert_eq!(overflowing_tags(entries.iter().map(|e| &e.kind)), vec![TypeTag::Int]);
    }

    #[test]
    fn test_decode_skips_missing_answer() {
        let mut row = SlotRow::new();
        row.insert("customInt1Answer".into(), json!(1));
        row.insert("customInt2Answer".into(), Value::Null);
        row.insert("customInt3Answer".into(), json!(3));
        row.insert("customInt4Answer".into(), json!(4));

        let answers = decode_answers(&row);

        assert_eq!(
            answers,
            vec![
                Answer::new(TypeTag::Int, 1),
                Answer::new(TypeTag::Int, 3),
                Answer::new(TypeTag::Int, 4),
            ]
        );
    }

    #[test]
    fn test_decode_skips_not_present_slots() {
        let mut row = encode_question_row(&[q(TypeTag::String, "A"), q(TypeTag::String, "B")]);
        row.insert("customString1State".into(), json!("NOT_PRESENT"));
        row.insert("customString3Question".into(), json!("stale"));

        let decoded = decode_questions(&row);
        assert_eq!(decoded, vec![q(TypeTag::String, "B")]);
    }

    #[test]
    fn test_answer_types_are_preserved() {
        let answers = vec![
            Answer::new(TypeTag::Bool, true),
            Answer::new(TypeTag::String, "hello"),
            Answer::new(TypeTag::Int, 42),
        ];

        let decoded = decode_answers(&encode_answer_row(&answers));

        assert_eq!(
            decoded,
            vec![
                Answer::new(TypeTag::String, "hello"),
                Answer::new(TypeTag::Int, 42),
                Answer::new(TypeTag::Bool, true),
            ]
        );
    }

    #[test]
    fn test_merge_defaults_missing_answers_to_null() {
        let questions = vec![q(TypeTag::String, "First"), q(TypeTag::String, "Second")];
        let answers = vec![Answer::new(TypeTag::String, "one")];

        let merged = merge(&questions, &answers);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].question, "First");
        assert_eq!(merged[0].answer, json!("one"));
        assert_eq!(merged[1].question, "Second");
        assert_eq!(merged[1].answer, Value::Null);
    }

    #[test]
    fn test_merge_ignores_surplus_answers() {
        let questions = vec![q(TypeTag::Bool, "Agree?")];
        let answers = vec![
            Answer::new(TypeTag::Bool, false),
            Answer::new(TypeTag::Bool, true),
            Answer::new(TypeTag::Int, 7),
        ];

        let merged = merge(&questions, &answers);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].answer, json!(false));
    }

    #[test]
    fn test_null_answer_shifts_later_answers_forward() {
        // An explicit null is stored but skipped on decode, so the next
        // answer of the same type pairs with the earlier question
        let questions = vec![q(TypeTag::String, "First"), q(TypeTag::String, "Second")];
        let answers = vec![
            Answer::new(TypeTag::String, Value::Null),
            Answer::new(TypeTag::String, "b"),
        ];

        let row = encode_answer_row(&answers);
        assert_eq!(row["customString1Answer"], Value::Null);
        assert_eq!(row["customString2Answer"], json!("b"));

        let merged = merge(&questions, &decode_answers(&row));
        assert_eq!(merged[0].question, "First");
        assert_eq!(merged[0].answer, json!("b"));
        assert_eq!(merged[1].question, "Second");
        assert_eq!(merged[1].answer, Value::Null);
    }

    #[test]
    fn test_merge_pairs_within_type_not_globally() {
        let questions = vec![
            q(TypeTag::Int, "Age"),
            q(TypeTag::String, "Name"),
            q(TypeTag::Int, "Siblings"),
        ];
        let answers = vec![
            Answer::new(TypeTag::String, "Ada"),
            Answer::new(TypeTag::Int, 36),
            Answer::new(TypeTag::Int, 0),
        ];

        let merged = merge(&questions, &answers);

        let pairs: Vec<(&str, Value)> = merged
            .iter()
            .map(|m| (m.question.as_str(), m.answer.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![("Name", json!("Ada")), ("Age", json!(36)), ("Siblings", json!(0))]
        );
    }

    #[test]
    fn test_decode_type_order_is_fixed() {
        let entries = vec![
            q(TypeTag::Bool, "b"),
            q(TypeTag::Text, "t"),
            q(TypeTag::Int, "i"),
            q(TypeTag::String, "s"),
        ];

        let kinds: Vec<TypeTag> = decode_questions(&encode_question_row(&entries))
            .into_iter()
            .map(|d| d.kind)
            .collect();

        assert_eq!(kinds, TypeTag::ALL.to_vec());
    }

    #[test]
    fn test_string_and_bool_scenario() {
        let entries = vec![
            Question::new(TypeTag::String, "Q1", "D1"),
            Question::new(TypeTag::Bool, "Q2", "D2"),
        ];

        assert_eq!(decode_questions(&encode_question_row(&entries)), entries);
    }

    #[test]
    fn test_empty_row_decodes_to_nothing() {
        assert!(decode_questions(&SlotRow::new()).is_empty());
        assert!(decode_answers(&SlotRow::new()).is_empty());
        assert!(merge(&[], &[Answer::new(TypeTag::Int, 1)]).is_empty());
    }
}
