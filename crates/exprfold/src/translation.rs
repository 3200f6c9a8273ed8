//! Translation lookup collaborator
//!
//! [`substitute_parameter`](crate::substitute_parameter) asks a
//! [`TranslationLookup`] whether an argument of a call names a translation
//! entry. The lookup itself is external to the evaluator; this module
//! defines the contract plus [`TranslationTable`], an in-memory
//! implementation keyed by translation key.

use dashmap::DashMap;
use tracing::trace;

use crate::eval::evaluate_constant;
use crate::tree::{ExprId, ExprTree};

// ═══════════════════════════════════════════════════════════════════════
// Contract
// ═══════════════════════════════════════════════════════════════════════

/// How the arguments supplied to a translated call disagree with the
/// format specifiers of the translation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormattingError {
    /// Fewer arguments than the text needs
    Missing,

    /// More arguments than the text uses
    Superfluous,
}

/// A translation entry found for a call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Translation key
    pub key: String,

    /// Translated text
    pub text: String,

    /// Argument-count mismatch, if any
    pub formatting_error: Option<FormattingError>,
}

impl Translation {
    /// Render this translation the way placeholder substitution shows it.
    pub fn render(&self) -> String {
        match self.formatting_error {
            Some(FormattingError::Missing) => {
                format!("{{ERROR: Missing formatting arguments for '{}'}}", self.text)
            }
            _ => self.text.clone(),
        }
    }
}

/// Finds the translation associated with an argument of a call.
pub trait TranslationLookup {
    /// Look at argument `argument_index` of `call` and return the
    /// translation it names, if any.
    fn find(&self, tree: &ExprTree, call: ExprId, argument_index: usize) -> Option<Translation>;
}

/// Lookup that never finds a translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslations;

impl TranslationLookup for NoTranslations {
    fn find(&self, _tree: &ExprTree, _call: ExprId, _argument_index: usize) -> Option<Translation> {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
// In-memory table
// ═══════════════════════════════════════════════════════════════════════

/// Concurrent map from translation key to text.
///
/// An argument names an entry when it folds to a known key. The arguments
/// following the key are the formatting arguments.
///
/// # Example
///
/// ```
/// use exprfold::{ExprTree, TranslationLookup, TranslationTable};
///
/// let table = TranslationTable::new();
/// table.insert("item.sword.name", "Sword of %s");
///
/// let mut tree = ExprTree::new();
/// let key = tree.literal("item.sword.name", "\"item.sword.name\"");
/// let call = tree.call(vec![key], "format(\"item.sword.name\")");
///
/// let found = table.find(&tree, call, 0).unwrap();
/// assert_eq!(found.text, "Sword of %s");
/// assert!(found.formatting_error.is_some());
/// ```
#[derive(Debug, Default)]
pub struct TranslationTable {
    entries: DashMap<String, String>,
}

impl TranslationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    /// Remove an entry, returning its text.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, text)| text)
    }

    /// Text for a key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let table = Self::new();
        for (key, text) in iter {
            table.insert(key, text);
        }
        table
    }
}

impl TranslationLookup for TranslationTable {
    fn find(&self, tree: &ExprTree, call: ExprId, argument_index: usize) -> Option<Translation> {
        let arguments = tree.call_arguments(call);
        let argument = *arguments.get(argument_index)?;
        let key = evaluate_constant(tree, argument, None, None)?;
        let text = self.get(&key)?;

        let supplied = arguments.len() - argument_index - 1;
        let required = count_format_arguments(&text);
        let formatting_error = if supplied < required {
            Some(FormattingError::Missing)
        } else if supplied > required {
            Some(FormattingError::Superfluous)
        } else {
            None
        };
        trace!(%key, required, supplied, ?formatting_error, "translation found");

        Some(Translation {
            key,
            text,
            formatting_error,
        })
    }
}

/// Number of arguments a `%`-style format string consumes.
///
/// Sequential specifiers (`%s`, `%5.2f`) take one argument each; explicit
/// positions (`%2$s`) raise the count to their index. `%%` and `%n` take
/// none.
pub fn count_format_arguments(text: &str) -> usize {
    let mut chars = text.chars().peekable();
    let mut sequential = 0;
    let mut highest_position = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.peek() {
            Some('%') | Some('n') => {
                chars.next();
                continue;
            }
            None => break,
            _ => {}
        }

        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }
        let position = if chars.peek() == Some(&'$') {
            chars.next();
            digits.parse::<usize>().ok()
        } else {
            None
        };

        // flags, width and precision
        while chars
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || "-#+ 0,(.<".contains(*c))
        {
            chars.next();
        }
        match chars.next() {
            Some(conversion) if conversion.is_ascii_alphabetic() => match position {
                Some(position) => highest_position = highest_position.max(position),
                None => sequential += 1,
            },
            _ => {}
        }
    }

    sequential.max(highest_position)
}
