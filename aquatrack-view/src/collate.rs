//! Locale-aware name comparison.
//!
//! Names are Japanese, so byte order is wrong for them (e.g. katakana vs
//! hiragana readings, full-width digits). [`NameCollator`] compares with the
//! ICU collation rules for `ja`.

use std::{cmp::Ordering, fmt};

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use tracing::warn;

pub struct NameCollator {
    collator: Option<Collator>,
}

impl fmt::Debug for NameCollator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameCollator")
            .field("icu", &self.collator.is_some())
            .finish()
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::japanese()
    }
}

impl NameCollator {
    /// Collator for the `ja` locale. If collation data can't be loaded, names
    /// are compared by code point.
    pub fn japanese() -> Self {
        match Collator::try_new(&locale!("ja").into(), CollatorOptions::new()) {
            Ok(collator) => Self {
                collator: Some(collator),
            },
            Err(e) => {
                warn!(error = %e, "ja collation unavailable; falling back to code point order");
                Self::code_point()
            }
        }
    }

    /// Plain code point order
    pub fn code_point() -> Self {
        Self { collator: None }
    }

    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(left, right),
            None => left.cmp(right),
        }
    }
}
