/*!
 * Pending writes collected during an enhancement run.
 *
 * Each batch reconciles into its own `UnitOfWork`; the orchestrator merges
 * them and commits the result once. Examples have no store id until commit,
 * so learning content refers to them by their position in `examples`.
 */

use crate::database::models::GradeLevel;

/// Position of an example within a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExampleKey(pub usize);

/// Insert-or-update of one sentence translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationWrite {
    pub sentence_id: i64,
    pub language_code: String,
    pub text: String,
}

/// A generated example and its translation
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleWrite {
    pub text: String,
    pub translation: String,
    pub language_code: String,
}

/// New reading and level for a word
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataWrite {
    pub word_id: i64,
    pub reading: String,
    pub level: GradeLevel,
}

/// Learning content for a word, pointing at an example in the same unit
#[derive(Debug, Clone, PartialEq)]
pub struct LearningContentWrite {
    pub word_id: i64,
    pub example: ExampleKey,
    pub meaning: String,
    pub usage_tip: String,
    pub language_code: String,
    pub model_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    translations: Vec<TranslationWrite>,
    examples: Vec<ExampleWrite>,
    metadata: Vec<MetadataWrite>,
    learning_contents: Vec<LearningContentWrite>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a translation; a later write for the same sentence and language wins
    pub fn upsert_translation(&mut self, write: TranslationWrite) {
        match self.translations.iter_mut().find(|t| {
            t.sentence_id == write.sentence_id && t.language_code == write.language_code
        }) {
            Some(existing) => existing.text = write.text,
            None => self.translations.push(write),
        }
    }

    pub fn add_example(&mut self, write: ExampleWrite) -> ExampleKey {
        self.examples.push(write);
        ExampleKey(self.examples.len() - 1)
    }

    /// Stage metadata and learning content for a word together
    pub fn enhance_word(&mut self, metadata: MetadataWrite, content: LearningContentWrite) {
        self.metadata.push(metadata);
        self.learning_contents.push(content);
    }

    /// Move all writes of `other` into this unit, re-keying its examples
    pub fn merge(&mut self, other: UnitOfWork) {
        let offset = self.examples.len();

        for translation in other.translations {
            self.upsert_translation(translation);
        }
        self.examples.extend(other.examples);
        self.metadata.extend(other.metadata);
        self.learning_contents
            .extend(other.learning_contents.into_iter().map(|mut content| {
                content.example = ExampleKey(content.example.0 + offset);
                content
            }));
    }

    pub fn translations(&self) -> &[TranslationWrite] {
        &self.translations
    }

    pub fn examples(&self) -> &[ExampleWrite] {
        &self.examples
    }

    pub fn metadata(&self) -> &[MetadataWrite] {
        &self.metadata
    }

    pub fn learning_contents(&self) -> &[LearningContentWrite] {
        &self.learning_contents
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
            && self.examples.is_empty()
            && self.metadata.is_empty()
            && self.learning_contents.is_empty()
    }

    /// Total number of staged writes
    pub fn len(&self) -> usize {
        self.translations.len()
            + self.examples.len()
            + self.metadata.len()
            + self.learning_contents.len()
    }
}
