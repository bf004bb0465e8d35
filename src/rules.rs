use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;

use crate::record::{FieldId, JobApplicationRecord};

/// One failed rule: the field it attaches to and the message shown under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub field: FieldId,
    pub message: &'static str,
}

/// A single validation rule. The table in `RULES` is the whole policy;
/// adding a rule means adding a row, not another bespoke check function.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Fails when the value is empty or whitespace-only.
    RequiredText { field: FieldId, message: &'static str },
    /// Fails unless the value parses as an absolute http(s) URL.
    /// Empty values are left to `RequiredText` so they raise one issue, not two.
    HttpUrl { field: FieldId, message: &'static str },
    /// Fails when a non-empty value does not look like an email address.
    EmailShape { field: FieldId, message: &'static str },
    /// Fails on characters outside digits, spaces, parens, '+' and '-'.
    PhoneCharset { field: FieldId, message: &'static str },
    /// Fails only on whitespace-only values; truly empty means "not provided".
    NonBlankIfPresent { field: FieldId, message: &'static str },
    /// Fails when both fields hold parseable dates and `later` < `earlier`.
    DateNotBefore { earlier: FieldId, later: FieldId, message: &'static str },
}

pub const RULES: &[Rule] = &[
    Rule::RequiredText { field: FieldId::RoleTitle, message: "Role title is required" },
    Rule::RequiredText { field: FieldId::CompanyName, message: "Company name is required" },
    Rule::RequiredText { field: FieldId::RoleType, message: "Role type is required" },
    Rule::RequiredText { field: FieldId::Location, message: "Location is required" },
    Rule::RequiredText { field: FieldId::DateApplied, message: "Date applied is required" },
    Rule::RequiredText { field: FieldId::AdvertLink, message: "Advert link is required" },
    Rule::RequiredText { field: FieldId::Status, message: "Status is required" },
    Rule::HttpUrl {
        field: FieldId::AdvertLink,
        message: "Only HTTP and HTTPS protocols are allowed",
    },
    Rule::NonBlankIfPresent { field: FieldId::Salary, message: "Salary cannot be empty" },
    Rule::EmailShape { field: FieldId::ContactEmail, message: "Must be a valid email" },
    Rule::PhoneCharset { field: FieldId::ContactPhone, message: "Invalid phone number format" },
    Rule::DateNotBefore {
        earlier: FieldId::DateApplied,
        later: FieldId::ResponseDate,
        message: "Response date cannot be before application date",
    },
];

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

impl Rule {
    /// Field a failure of this rule attaches to. Cross-field rules blame the
    /// dependent field, not the one it is compared against.
    pub fn target(&self) -> FieldId {
        match *self {
            Rule::RequiredText { field, .. }
            | Rule::HttpUrl { field, .. }
            | Rule::EmailShape { field, .. }
            | Rule::PhoneCharset { field, .. }
            | Rule::NonBlankIfPresent { field, .. } => field,
            Rule::DateNotBefore { later, .. } => later,
        }
    }

    fn message(&self) -> &'static str {
        match *self {
            Rule::RequiredText { message, .. }
            | Rule::HttpUrl { message, .. }
            | Rule::EmailShape { message, .. }
            | Rule::PhoneCharset { message, .. }
            | Rule::NonBlankIfPresent { message, .. }
            | Rule::DateNotBefore { message, .. } => message,
        }
    }

    /// None when the record satisfies this rule.
    fn check(&self, record: &JobApplicationRecord) -> Option<Issue> {
        let failed = match *self {
            Rule::RequiredText { field, .. } => record.get(field).trim().is_empty(),
            Rule::HttpUrl { field, .. } => {
                let value = record.get(field);
                let value = value.trim();
                if value.is_empty() {
                    false
                } else {
                    match Url::parse(value) {
                        Ok(url) => !matches!(url.scheme(), "http" | "https"),
                        // relative links have no protocol to trust
                        Err(_) => true,
                    }
                }
            }
            Rule::EmailShape { field, .. } => {
                let value = record.get(field);
                !value.is_empty() && !EMAIL_SHAPE.is_match(&value)
            }
            Rule::PhoneCharset { field, .. } => !record
                .get(field)
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '(' | ')' | '+' | '-')),
            Rule::NonBlankIfPresent { field, .. } => {
                let value = record.get(field);
                !value.is_empty() && value.trim().is_empty()
            }
            Rule::DateNotBefore { earlier, later, .. } => {
                match (parse_date(&record.get(earlier)), parse_date(&record.get(later))) {
                    (Some(start), Some(end)) => end < start,
                    // unparseable or absent dates are not this rule's concern
                    _ => false,
                }
            }
        };
        failed.then(|| Issue { field: self.target(), message: self.message() })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Run every rule over the record, in table order.
pub fn validate(record: &JobApplicationRecord) -> Result<(), Vec<Issue>> {
    let issues: Vec<Issue> = RULES.iter().filter_map(|rule| rule.check(record)).collect();
    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

/// First failure among the rules targeting one field, if any.
pub fn check_field(record: &JobApplicationRecord, field: FieldId) -> Option<Issue> {
    RULES
        .iter()
        .filter(|rule| rule.target() == field)
        .find_map(|rule| rule.check(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> JobApplicationRecord {
        let mut record = JobApplicationRecord::default();
        record.role_title = "Senior Rust Engineer".to_string();
        record.company_name = "Acme".to_string();
        record.role_type = "Permanent".to_string();
        record.location = "Remote".to_string();
        record.date_applied = "2024-01-15".to_string();
        record.advert_link = "https://jobs.acme.example/rust".to_string();
        record.status = "Applied".to_string();
        record
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(validate(&valid_record()).is_ok());
    }

    #[test]
    fn test_each_required_field_raises_exactly_one_issue() {
        let cases = [
            (FieldId::RoleTitle, "Role title is required"),
            (FieldId::CompanyName, "Company name is required"),
            (FieldId::RoleType, "Role type is required"),
            (FieldId::Location, "Location is required"),
            (FieldId::DateApplied, "Date applied is required"),
            (FieldId::AdvertLink, "Advert link is required"),
            (FieldId::Status, "Status is required"),
        ];
        for (field, message) in cases {
            let mut record = valid_record();
            record.set(field, "");
            let issues = validate(&record).unwrap_err();
            assert_eq!(issues.len(), 1, "field {:?}", field);
            assert_eq!(issues[0].field, field);
            assert_eq!(issues[0].message, message);
        }
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let mut record = valid_record();
        record.role_title = "   ".to_string();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Role title is required");
    }

    #[test]
    fn test_advert_link_rejects_unsafe_schemes() {
        for link in ["javascript:alert(1)", "data:text/html,hi", "file:///etc/passwd", "ftp://x"] {
            let mut record = valid_record();
            record.advert_link = link.to_string();
            let issues = validate(&record).unwrap_err();
            assert_eq!(issues.len(), 1, "link {link}");
            assert_eq!(issues[0].field, FieldId::AdvertLink);
            assert_eq!(issues[0].message, "Only HTTP and HTTPS protocols are allowed");
        }
    }

    #[test]
    fn test_advert_link_rejects_relative_urls() {
        let mut record = valid_record();
        record.advert_link = "jobs.acme.example/rust".to_string();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues[0].message, "Only HTTP and HTTPS protocols are allowed");
    }

    #[test]
    fn test_advert_link_accepts_http_and_https() {
        for link in ["http://jobs.acme.example/rust", "HTTPS://jobs.acme.example/rust"] {
            let mut record = valid_record();
            record.advert_link = link.to_string();
            assert!(validate(&record).is_ok(), "link {link}");
        }
    }

    #[test]
    fn test_email_optional_but_shape_checked() {
        let mut record = valid_record();
        record.contact_email = String::new();
        assert!(validate(&record).is_ok());

        record.contact_email = "jane@acme.example".to_string();
        assert!(validate(&record).is_ok());

        record.contact_email = "not-an-email".to_string();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues[0].field, FieldId::ContactEmail);
        assert_eq!(issues[0].message, "Must be a valid email");

        // whitespace is not "empty" and never a valid address
        record.contact_email = "   ".to_string();
        assert!(validate(&record).is_err());
    }

    #[test]
    fn test_phone_charset() {
        let mut record = valid_record();
        record.contact_phone = "+44 (0) 7700-900123".to_string();
        assert!(validate(&record).is_ok());

        record.contact_phone = String::new();
        assert!(validate(&record).is_ok());

        record.contact_phone = "555-CALL".to_string();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues[0].field, FieldId::ContactPhone);
        assert_eq!(issues[0].message, "Invalid phone number format");
    }

    #[test]
    fn test_salary_may_be_absent_but_not_blank() {
        let mut record = valid_record();
        record.salary = String::new();
        assert!(validate(&record).is_ok());

        record.salary = "90000".to_string();
        assert!(validate(&record).is_ok());

        record.salary = "  ".to_string();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues[0].field, FieldId::Salary);
        assert_eq!(issues[0].message, "Salary cannot be empty");
    }

    #[test]
    fn test_response_date_ordering() {
        let mut record = valid_record();
        record.response_date = "2024-01-10".to_string();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, FieldId::ResponseDate);
        assert_eq!(issues[0].message, "Response date cannot be before application date");

        // same day and later are both fine
        record.response_date = "2024-01-15".to_string();
        assert!(validate(&record).is_ok());
        record.response_date = "2024-02-01".to_string();
        assert!(validate(&record).is_ok());

        // no response yet
        record.response_date = String::new();
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_unparseable_dates_skip_the_ordering_rule() {
        let mut record = valid_record();
        record.date_applied = "last Tuesday".to_string();
        record.response_date = "2024-01-10".to_string();
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_check_field_scopes_to_one_field() {
        let mut record = valid_record();
        record.role_title = String::new();
        record.contact_email = "bad".to_string();

        let issue = check_field(&record, FieldId::ContactEmail).unwrap();
        assert_eq!(issue.field, FieldId::ContactEmail);
        assert_eq!(issue.message, "Must be a valid email");

        let issue = check_field(&record, FieldId::RoleTitle).unwrap();
        assert_eq!(issue.message, "Role title is required");

        assert!(check_field(&record, FieldId::CompanyName).is_none());
    }

    #[test]
    fn test_check_field_sees_cross_field_rule_from_response_date() {
        let mut record = valid_record();
        record.response_date = "2024-01-01".to_string();
        let issue = check_field(&record, FieldId::ResponseDate).unwrap();
        assert_eq!(issue.message, "Response date cannot be before application date");

        // the rule blames responseDate, so dateApplied stays clean
        assert!(check_field(&record, FieldId::DateApplied).is_none());
    }

    #[test]
    fn test_issue_order_follows_table_order() {
        let record = JobApplicationRecord::default();
        let issues = validate(&record).unwrap_err();
        assert_eq!(issues.len(), 7);
        assert_eq!(issues[0].field, FieldId::RoleTitle);
        assert_eq!(issues[6].field, FieldId::Status);
    }
}
