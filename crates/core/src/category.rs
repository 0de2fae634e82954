//! The closed set of intents a chat message can be classified into.
//!
//! Numeric ids are part of the contract: they key rows in the external
//! `model_resp` table, and the resolver compares them against the
//! open-ended threshold.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum Category {
    Greeting = 1,
    VisionMission = 2,
    FacilitiesServices = 3,
    Contact = 4,
    DoctorSchedule = 5,
    GeneralInquiry = 6,
    DeeperInquiry = 7,
    Treatment = 8,
    Caregiving = 9,
    /// Default when no rule matches.
    Unrecognized = 10,
    /// Never produced by the classifier; resolvable when set explicitly.
    PleaseRepeat = 11,
    Farewell = 12,
    Registration = 13,
    RegistrationFee = 14,
    BpjsRequirements = 15,
    AdultPsychiatryClinic = 16,
    ObstetricsClinic = 17,
    NeurologyClinic = 18,
    InternalMedicineClinic = 19,
    DentalClinic = 20,
    OralSurgeryClinic = 21,
    PediatricsClinic = 22,
    GeneralSurgeryClinic = 23,
    AddictionClinic = 24,
    PatientPickup = 25,
    ChildbirthCost = 26,
    OtherInformation = 27,
    Complaints = 28,
    VisitingHours = 29,
    DevTest = 30,
    ChatDisclaimer = 31,
}

impl Category {
    /// Every category, in id order.
    pub const ALL: [Category; 31] = [
        Category::Greeting,
        Category::VisionMission,
        Category::FacilitiesServices,
        Category::Contact,
        Category::DoctorSchedule,
        Category::GeneralInquiry,
        Category::DeeperInquiry,
        Category::Treatment,
        Category::Caregiving,
        Category::Unrecognized,
        Category::PleaseRepeat,
        Category::Farewell,
        Category::Registration,
        Category::RegistrationFee,
        Category::BpjsRequirements,
        Category::AdultPsychiatryClinic,
        Category::ObstetricsClinic,
        Category::NeurologyClinic,
        Category::InternalMedicineClinic,
        Category::DentalClinic,
        Category::OralSurgeryClinic,
        Category::PediatricsClinic,
        Category::GeneralSurgeryClinic,
        Category::AddictionClinic,
        Category::PatientPickup,
        Category::ChildbirthCost,
        Category::OtherInformation,
        Category::Complaints,
        Category::VisitingHours,
        Category::DevTest,
        Category::ChatDisclaimer,
    ];

    /// The numeric id used by the knowledge table.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Look up a category by its numeric id.
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.id() == id)
    }

    /// A stable snake_case label for logs and CLI output.
    pub fn label(self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::VisionMission => "vision_mission",
            Category::FacilitiesServices => "facilities_services",
            Category::Contact => "contact",
            Category::DoctorSchedule => "doctor_schedule",
            Category::GeneralInquiry => "general_inquiry",
            Category::DeeperInquiry => "deeper_inquiry",
            Category::Treatment => "treatment",
            Category::Caregiving => "caregiving",
            Category::Unrecognized => "unrecognized",
            Category::PleaseRepeat => "please_repeat",
            Category::Farewell => "farewell",
            Category::Registration => "registration",
            Category::RegistrationFee => "registration_fee",
            Category::BpjsRequirements => "bpjs_requirements",
            Category::AdultPsychiatryClinic => "adult_psychiatry_clinic",
            Category::ObstetricsClinic => "obstetrics_clinic",
            Category::NeurologyClinic => "neurology_clinic",
            Category::InternalMedicineClinic => "internal_medicine_clinic",
            Category::DentalClinic => "dental_clinic",
            Category::OralSurgeryClinic => "oral_surgery_clinic",
            Category::PediatricsClinic => "pediatrics_clinic",
            Category::GeneralSurgeryClinic => "general_surgery_clinic",
            Category::AddictionClinic => "addiction_clinic",
            Category::PatientPickup => "patient_pickup",
            Category::ChildbirthCost => "childbirth_cost",
            Category::OtherInformation => "other_information",
            Category::Complaints => "complaints",
            Category::VisitingHours => "visiting_hours",
            Category::DevTest => "dev_test",
            Category::ChatDisclaimer => "chat_disclaimer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.id())
    }
}

impl From<Category> for u16 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

/// Returned when a numeric id does not name any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown category id: {0}")]
pub struct UnknownCategory(pub i64);

impl TryFrom<u16> for Category {
    type Error = UnknownCategory;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Category::from_id(id).ok_or(UnknownCategory(i64::from(id)))
    }
}

impl TryFrom<i64> for Category {
    type Error = UnknownCategory;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        u16::try_from(id)
            .ok()
            .and_then(Category::from_id)
            .ok_or(UnknownCategory(id))
    }
}
