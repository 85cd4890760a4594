/*!
 * Maps validated responses back onto domain records.
 */

use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use super::payload::BatchPayload;
use super::schema::AIResponse;
use super::unit_of_work::{
    ExampleKey, ExampleWrite, LearningContentWrite, MetadataWrite, TranslationWrite, UnitOfWork,
};
use crate::errors::MappingError;

/// Stages the writes implied by one batch response
#[derive(Debug, Clone)]
pub struct ResultReconciler {
    language_code: String,
    model_name: String,
}

impl ResultReconciler {
    pub fn new(language_code: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            model_name: model_name.into(),
        }
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Stage translations, examples and word content for one batch.
    ///
    /// Returns the number of words that received learning content. Words
    /// with no resolvable example are left untouched so a later run picks
    /// them up again.
    pub fn reconcile(
        &self,
        payload: &BatchPayload,
        response: &AIResponse,
        work: &mut UnitOfWork,
    ) -> usize {
        for translation in &response.translations {
            match payload.resolve_sentence(translation.sentence_ref) {
                Some(sentence_id) => work.upsert_translation(TranslationWrite {
                    sentence_id,
                    language_code: self.language_code.clone(),
                    text: translation.text.clone(),
                }),
                None => warn!(
                    "Skipping translation: {}",
                    MappingError::UnknownSentence(translation.sentence_ref)
                ),
            }
        }

        // One example pair per group
        let mut examples_by_group: HashMap<i64, ExampleKey> = HashMap::new();
        for example in &response.examples {
            if examples_by_group.contains_key(&example.group_ref) {
                warn!(
                    "Skipping example: {}",
                    MappingError::DuplicateGroup(example.group_ref)
                );
                continue;
            }
            let key = work.add_example(ExampleWrite {
                text: example.text.clone(),
                translation: example.translation.clone(),
                language_code: self.language_code.clone(),
            });
            examples_by_group.insert(example.group_ref, key);
        }

        let word_ids: Vec<i64> = payload.request.word_ids().collect();
        let mut enhanced_ids: HashSet<i64> = HashSet::new();

        for definition in &response.word_definitions {
            if !word_ids.contains(&definition.word_ref) {
                warn!(
                    "Skipping definition: {}",
                    MappingError::UnknownWord(definition.word_ref)
                );
                continue;
            }
            if enhanced_ids.contains(&definition.word_ref) {
                warn!(
                    "Skipping definition: {}",
                    MappingError::DuplicateWord(definition.word_ref)
                );
                continue;
            }

            let Some(key) = response
                .example_for_word(definition.word_ref)
                .and_then(|example| examples_by_group.get(&example.group_ref))
            else {
                warn!(
                    "Leaving word pending: {}",
                    MappingError::NoExampleGroup(definition.word_ref)
                );
                continue;
            };

            work.enhance_word(
                MetadataWrite {
                    word_id: definition.word_ref,
                    reading: definition.reading.clone(),
                    level: definition.level,
                },
                LearningContentWrite {
                    word_id: definition.word_ref,
                    example: *key,
                    meaning: definition.meaning.clone(),
                    usage_tip: format!("JLPT {} level word", definition.level),
                    language_code: self.language_code.clone(),
                    model_name: self.model_name.clone(),
                },
            );
            enhanced_ids.insert(definition.word_ref);
        }

        let enhanced = enhanced_ids.len();

        debug!(
            "Reconciled batch: {} translations, {} examples, {} words",
            response.translations.len(),
            response.examples.len(),
            enhanced
        );
        enhanced
    }
}
