use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One job application being drafted. Serialized with the same camelCase
/// keys the submission endpoint and the stored draft use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct JobApplicationRecord {
    pub role_title: String,
    pub company_name: String,
    pub role_type: String,
    pub location: String,
    pub salary: String,
    pub date_applied: String, // ISO date text (YYYY-MM-DD)
    pub advert_link: String,
    pub cv_used: String,
    pub response_date: String, // ISO date text, empty permitted
    pub status: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub is_linked_in_connection: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    RoleTitle,
    CompanyName,
    RoleType,
    Location,
    Salary,
    DateApplied,
    AdvertLink,
    CvUsed,
    ResponseDate,
    Status,
    ContactName,
    ContactEmail,
    ContactPhone,
    IsLinkedInConnection,
}

impl FieldId {
    pub const ALL: [FieldId; 14] = [
        FieldId::RoleTitle,
        FieldId::CompanyName,
        FieldId::RoleType,
        FieldId::Location,
        FieldId::Salary,
        FieldId::DateApplied,
        FieldId::AdvertLink,
        FieldId::CvUsed,
        FieldId::ResponseDate,
        FieldId::Status,
        FieldId::ContactName,
        FieldId::ContactEmail,
        FieldId::ContactPhone,
        FieldId::IsLinkedInConnection,
    ];

    /// JSON key, matching the serde rename on `JobApplicationRecord`.
    pub fn name(self) -> &'static str {
        match self {
            FieldId::RoleTitle => "roleTitle",
            FieldId::CompanyName => "companyName",
            FieldId::RoleType => "roleType",
            FieldId::Location => "location",
            FieldId::Salary => "salary",
            FieldId::DateApplied => "dateApplied",
            FieldId::AdvertLink => "advertLink",
            FieldId::CvUsed => "cvUsed",
            FieldId::ResponseDate => "responseDate",
            FieldId::Status => "status",
            FieldId::ContactName => "contactName",
            FieldId::ContactEmail => "contactEmail",
            FieldId::ContactPhone => "contactPhone",
            FieldId::IsLinkedInConnection => "isLinkedInConnection",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldId::RoleTitle => "Role title",
            FieldId::CompanyName => "Company name",
            FieldId::RoleType => "Role type",
            FieldId::Location => "Location",
            FieldId::Salary => "Salary",
            FieldId::DateApplied => "Date applied",
            FieldId::AdvertLink => "Advert link",
            FieldId::CvUsed => "CV used",
            FieldId::ResponseDate => "Response date",
            FieldId::Status => "Status",
            FieldId::ContactName => "Contact name",
            FieldId::ContactEmail => "Contact email",
            FieldId::ContactPhone => "Contact phone",
            FieldId::IsLinkedInConnection => "LinkedIn connection",
        }
    }

    /// True only for the checkbox field; everything else edits as text.
    pub fn is_flag(self) -> bool {
        matches!(self, FieldId::IsLinkedInConnection)
    }

    /// Resolve a field named on the command line. Accepts the JSON key,
    /// kebab-case, and a few short aliases.
    pub fn from_arg(raw: &str) -> Result<FieldId> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "roletitle" | "title" => Ok(FieldId::RoleTitle),
            "companyname" | "company" => Ok(FieldId::CompanyName),
            "roletype" => Ok(FieldId::RoleType),
            "location" => Ok(FieldId::Location),
            "salary" => Ok(FieldId::Salary),
            "dateapplied" | "applied" => Ok(FieldId::DateApplied),
            "advertlink" | "link" | "url" => Ok(FieldId::AdvertLink),
            "cvused" | "cv" => Ok(FieldId::CvUsed),
            "responsedate" | "response" => Ok(FieldId::ResponseDate),
            "status" => Ok(FieldId::Status),
            "contactname" => Ok(FieldId::ContactName),
            "contactemail" | "email" => Ok(FieldId::ContactEmail),
            "contactphone" | "phone" => Ok(FieldId::ContactPhone),
            "islinkedinconnection" | "linkedin" => Ok(FieldId::IsLinkedInConnection),
            _ => Err(anyhow!(
                "Unknown field '{}'. Available: role-title, company-name, role-type, \
                 location, salary, date-applied, advert-link, cv-used, response-date, \
                 status, contact-name, contact-email, contact-phone, linkedin",
                raw
            )),
        }
    }
}

impl JobApplicationRecord {
    /// Uniform text view of a field; the flag renders as "true"/"false".
    pub fn get(&self, field: FieldId) -> String {
        match field {
            FieldId::RoleTitle => self.role_title.clone(),
            FieldId::CompanyName => self.company_name.clone(),
            FieldId::RoleType => self.role_type.clone(),
            FieldId::Location => self.location.clone(),
            FieldId::Salary => self.salary.clone(),
            FieldId::DateApplied => self.date_applied.clone(),
            FieldId::AdvertLink => self.advert_link.clone(),
            FieldId::CvUsed => self.cv_used.clone(),
            FieldId::ResponseDate => self.response_date.clone(),
            FieldId::Status => self.status.clone(),
            FieldId::ContactName => self.contact_name.clone(),
            FieldId::ContactEmail => self.contact_email.clone(),
            FieldId::ContactPhone => self.contact_phone.clone(),
            FieldId::IsLinkedInConnection => self.is_linked_in_connection.to_string(),
        }
    }

    pub fn set(&mut self, field: FieldId, value: &str) {
        match field {
            FieldId::RoleTitle => self.role_title = value.to_string(),
            FieldId::CompanyName => self.company_name = value.to_string(),
            FieldId::RoleType => self.role_type = value.to_string(),
            FieldId::Location => self.location = value.to_string(),
            FieldId::Salary => self.salary = value.to_string(),
            FieldId::DateApplied => self.date_applied = value.to_string(),
            FieldId::AdvertLink => self.advert_link = value.to_string(),
            FieldId::CvUsed => self.cv_used = value.to_string(),
            FieldId::ResponseDate => self.response_date = value.to_string(),
            FieldId::Status => self.status = value.to_string(),
            FieldId::ContactName => self.contact_name = value.to_string(),
            FieldId::ContactEmail => self.contact_email = value.to_string(),
            FieldId::ContactPhone => self.contact_phone = value.to_string(),
            FieldId::IsLinkedInConnection => {
                self.is_linked_in_connection =
                    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes");
            }
        }
    }
}
