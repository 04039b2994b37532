//! Undefined-code handling policy.

use cdef_definition::HandlingHints;
use cdef_model::{ClassificationError, HandlingCompatibility, Result, UndefinedHandlingType};

/// Decides how generated accessors react to a code outside a classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlingResolver {
    compatibility: HandlingCompatibility,
}

impl HandlingResolver {
    pub fn new(compatibility: HandlingCompatibility) -> Self {
        Self { compatibility }
    }

    pub fn compatibility(&self) -> HandlingCompatibility {
        self.compatibility
    }

    /// Resolve the handling type of one classification.
    ///
    /// Precedence:
    /// 1. `checkImplicitSet = true` always means EXCEPTION
    /// 2. an explicit `undefinedHandlingType` code
    /// 3. an explicit `checkSelectedClassification` flag
    /// 4. the compatibility default
    pub fn resolve_handling_type(
        &self,
        classification: &str,
        hints: &HandlingHints,
    ) -> Result<UndefinedHandlingType> {
        if hints.check_implicit_set == Some(true) {
            return Ok(UndefinedHandlingType::Exception);
        }
        if let Some(code) = &hints.undefined_handling_type {
            return UndefinedHandlingType::from_code(code).ok_or_else(|| {
                ClassificationError::UnknownHandlingType {
                    classification: classification.to_string(),
                    code: code.clone(),
                }
            });
        }
        Ok(match hints.check_selected_classification {
            Some(true) => UndefinedHandlingType::Exception,
            Some(false) => UndefinedHandlingType::Allowed,
            None => self.plain_handling_type(),
        })
    }

    /// The handling type when no classification-level override exists.
    pub fn plain_handling_type(&self) -> UndefinedHandlingType {
        self.compatibility.default_handling()
    }

    pub fn should_check_code(handling: UndefinedHandlingType) -> bool {
        handling.is_checked()
    }
}
