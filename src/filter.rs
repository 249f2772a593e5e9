//! Data-described service matching for the find-service helper.
//!
//! The outer surface never accepts caller-supplied code; it accepts a
//! field/operator/value triple evaluated against each [`ServiceRecord`]
//! in order, with early exit on first match.

use serde::{Deserialize, Serialize};

use crate::records::ServiceRecord;

/// Seam used by the facades' find-service scan. Blanket-implemented for
/// closures so library callers (and tests) can match programmatically; the
/// dispatch surface goes through [`ServiceFilter`], which stays purely
/// data-driven.
pub trait ServiceMatcher {
    fn matches(&mut self, service: &ServiceRecord) -> bool;
}

impl<F> ServiceMatcher for F
where
    F: FnMut(&ServiceRecord) -> bool,
{
    fn matches(&mut self, service: &ServiceRecord) -> bool {
        self(service)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceField {
    Id,
    Name,
    Price,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Contains,
}

/// One predicate over a service record, expressed as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFilter {
    pub field: ServiceField,
    pub op: FilterOp,
    pub value: String,
}

impl ServiceFilter {
    fn field_text(&self, service: &ServiceRecord) -> String {
        match self.field {
            ServiceField::Id => service.id.clone(),
            ServiceField::Name => service.name.clone(),
            ServiceField::Price => service.price.clone(),
            ServiceField::Count => service.count.to_string(),
        }
    }

    pub fn matches(&self, service: &ServiceRecord) -> bool {
        let actual = self.field_text(service);
        match self.op {
            FilterOp::Eq => actual == self.value,
            FilterOp::Ne => actual != self.value,
            FilterOp::Contains => actual.contains(&self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str, name: &str) -> ServiceRecord {
        ServiceRecord {
            id: id.into(),
            name: name.into(),
            price: "25.00".into(),
            count: 10,
        }
    }

    #[test]
    fn eq_filter_matches_exact_name() {
        let filter = ServiceFilter {
            field: ServiceField::Name,
            op: FilterOp::Eq,
            value: "Drop In".into(),
        };
        assert!(filter.matches(&service("1", "Drop In")));
        assert!(!filter.matches(&service("2", "10 Pack")));
    }

    #[test]
    fn contains_filter_is_substring_match() {
        let filter = ServiceFilter {
            field: ServiceField::Name,
            op: FilterOp::Contains,
            value: "Pack".into(),
        };
        assert!(filter.matches(&service("2", "10 Pack")));
        assert!(!filter.matches(&service("1", "Drop In")));
    }

    #[test]
    fn count_field_compares_as_text() {
        let filter = ServiceFilter {
            field: ServiceField::Count,
            op: FilterOp::Eq,
            value: "10".into(),
        };
        assert!(filter.matches(&service("1", "Drop In")));
    }

    #[test]
    fn closures_are_matchers() {
        let mut seen = 0;
        let mut matcher = |s: &ServiceRecord| {
            seen += 1;
            s.id == "2"
        };
        assert!(!matcher.matches(&service("1", "a")));
        assert!(matcher.matches(&service("2", "b")));
        assert_eq!(seen, 2);
    }

    #[test]
    fn a_filter_can_back_a_matcher_closure() {
        let filter = ServiceFilter {
            field: ServiceField::Id,
            op: FilterOp::Eq,
            value: "2".into(),
        };
        let mut matcher = |s: &ServiceRecord| filter.matches(s);
        assert!(matcher.matches(&service("2", "10 Pack")));
    }
}
