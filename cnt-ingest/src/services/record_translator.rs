//! Per-field record translation with bounded retry
//!
//! A field that cannot be translated keeps its original text and is reported
//! as failed; the record itself always proceeds.

use cnt_common::record::{RecordId, TextField};
use cnt_common::Record;

use crate::types::{TranslateError, Translator};
use crate::utils::{retry_with_backoff, RetryOutcome, RetryPolicy};

/// What happened to one field of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    /// Replaced with translated text
    Translated { attempts: u32 },
    /// Absent or blank; no provider call made
    Skipped,
    /// Retries exhausted; original text kept
    Failed { attempts: u32, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    pub record_id: RecordId,
    pub field: TextField,
    pub status: FieldStatus,
}

/// Aggregated field outcomes for a record or a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl TransformReport {
    pub fn translated(&self) -> usize {
        self.count(|s| matches!(s, FieldStatus::Translated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FieldStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FieldStatus::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FieldStatus::Failed { .. }))
    }

    /// Share of attempted fields that were translated; `None` if none were attempted
    pub fn success_rate(&self) -> Option<f64> {
        let attempted = self.translated() + self.failed();
        if attempted == 0 {
            None
        } else {
            Some(self.translated() as f64 / attempted as f64)
        }
    }

    pub fn extend(&mut self, other: TransformReport) {
        self.outcomes.extend(other.outcomes);
    }

    fn count(&self, pred: impl Fn(&FieldStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Translates the configured fields of records, in order
pub struct RecordTranslator<T> {
    translator: T,
    target_lang: String,
    fields: Vec<TextField>,
    retry: RetryPolicy,
}

impl<T: Translator> RecordTranslator<T> {
    pub fn new(translator: T, target_lang: impl Into<String>, fields: Vec<TextField>, retry: RetryPolicy) -> Self {
        Self {
            translator,
            target_lang: target_lang.into(),
            fields,
            retry,
        }
    }

    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    /// Translate every configured field of one record
    ///
    /// **Algorithm (per field, in configured order):**
    /// 1. Absent field: `Skipped`
    /// 2. Blank text: set to empty, `Skipped`, no provider call
    /// 3. Otherwise call the provider up to `max_attempts` times; a blank
    ///    result counts as a malformed response and is retried
    /// 4. Success replaces the text; exhaustion keeps the original and reports `Failed`
    pub async fn translate_record(&self, mut record: Record) -> (Record, TransformReport) {
        let mut report = TransformReport::default();

        for &field in &self.fields {
            let status = match record.text(field).map(str::to_owned) {
                None => FieldStatus::Skipped,
                Some(text) if text.trim().is_empty() => {
                    record.set_text(field, String::new());
                    FieldStatus::Skipped
                }
                Some(text) => {
                    let operation = format!("translate {}", field);
                    let (translator, source, lang) = (&self.translator, text.as_str(), self.target_lang.as_str());
                    let outcome = retry_with_backoff(&operation, &self.retry, move |_| async move {
                        let translated = translator.translate(source, lang).await?;
                        // Non-blank input never translates to nothing
                        if translated.trim().is_empty() {
                            return Err(TranslateError::Malformed("empty translation".to_string()));
                        }
                        Ok::<_, TranslateError>(translated)
                    })
                    .await;

                    match outcome {
                        RetryOutcome::Succeeded { value, attempts } => {
                            record.set_text(field, value);
                            FieldStatus::Translated { attempts }
                        }
                        RetryOutcome::Exhausted {
                            attempts,
                            last_error,
                        } => {
                            tracing::warn!(
                                id = %record.id(),
                                field = %field,
                                attempts,
                                error = %last_error,
                                "Translation failed, keeping original text"
                            );
                            FieldStatus::Failed {
                                attempts,
                                error: last_error.to_string(),
                            }
                        }
                    }
                }
            };

            report.outcomes.push(FieldOutcome {
                record_id: record.id().clone(),
                field,
                status,
            });
        }

        (record, report)
    }

    /// Translate a batch record by record
    pub async fn translate_batch(&self, records: Vec<Record>) -> (Vec<Record>, TransformReport) {
        let mut translated = Vec::with_capacity(records.len());
        let mut report = TransformReport::default();

        for record in records {
            let (record, record_report) = self.translate_record(record).await;
            translated.push(record);
            report.extend(record_report);
        }

        tracing::info!(
            records = translated.len(),
            translated = report.translated(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Translated batch"
        );

        (translated, report)
    }
}
