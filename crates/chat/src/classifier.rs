//! Ordered keyword classifier.
//!
//! The input is lower-cased and tested against [`RULES`] from top to bottom.
//! A rule matches when ANY of its phrases is a literal substring of the
//! lower-cased input: no tokenization, no stemming, no word boundaries. The
//! first matching rule wins, so the table order is the priority order.
//!
//! Two shadowed entries are kept on purpose because the table order is part
//! of the contract:
//! - `daftar` (registration) precedes every registration-fee phrase, so fee
//!   questions classify as [`Category::Registration`].
//! - `obat` appears under both treatment and caregiving; treatment wins.

use aminochat_core::Category;
use tracing::{debug, warn};

/// One entry of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: Category,
    /// Lower-case phrases; any one of them present is a match.
    pub phrases: &'static [&'static str],
}

impl Rule {
    /// The first phrase of this rule found in `lowered`, if any.
    pub fn find(&self, lowered: &str) -> Option<&'static str> {
        self.phrases.iter().copied().find(|p| lowered.contains(p))
    }
}

/// The rule table, in priority order.
pub static RULES: &[Rule] = &[
    // Greetings. Each phrase is tested on its own.
    Rule {
        category: Category::Greeting,
        phrases: &["hai", "hey", "halo", "hello", "hei"],
    },
    // About the hospital
    Rule {
        category: Category::VisionMission,
        phrases: &["visi", "misi", "visi misi"],
    },
    Rule {
        category: Category::FacilitiesServices,
        phrases: &["fasilitas", "layanan"],
    },
    Rule {
        category: Category::Contact,
        phrases: &["kontak", "alamat", "menghubungi"],
    },
    Rule {
        category: Category::DoctorSchedule,
        phrases: &["jadwal dokter"],
    },
    // Registration
    Rule {
        category: Category::Registration,
        phrases: &["mendaftar", "pendaftaran", "daftar"],
    },
    Rule {
        category: Category::RegistrationFee,
        phrases: &["biaya mendaftar", "biaya pendaftaran", "biaya daftar"],
    },
    Rule {
        category: Category::BpjsRequirements,
        phrases: &["syarat bpjs"],
    },
    // Clinics
    Rule {
        category: Category::AdultPsychiatryClinic,
        phrases: &["poli jiwa dewasa"],
    },
    Rule {
        category: Category::ObstetricsClinic,
        phrases: &["poli kandungan"],
    },
    Rule {
        category: Category::NeurologyClinic,
        phrases: &["poli syaraf"],
    },
    Rule {
        category: Category::InternalMedicineClinic,
        phrases: &["poli penyakit dalam"],
    },
    Rule {
        category: Category::DentalClinic,
        phrases: &["poli gigi"],
    },
    Rule {
        category: Category::OralSurgeryClinic,
        phrases: &["poli bedah mulut"],
    },
    Rule {
        category: Category::PediatricsClinic,
        phrases: &["poli kesehatan anak"],
    },
    Rule {
        category: Category::GeneralSurgeryClinic,
        phrases: &["poli bedah umum"],
    },
    Rule {
        category: Category::AddictionClinic,
        phrases: &["poli adiksi"],
    },
    // Operational
    Rule {
        category: Category::PatientPickup,
        phrases: &["penjemputan pasien", "menjemput pasien"],
    },
    Rule {
        category: Category::ChildbirthCost,
        phrases: &["biaya persalinan"],
    },
    Rule {
        category: Category::OtherInformation,
        phrases: &["informasi lain", "informasi lainnya", "info lainnya", "info lain"],
    },
    Rule {
        category: Category::Complaints,
        phrases: &["pengaduan", "kritik dan saran", "krisar"],
    },
    Rule {
        category: Category::VisitingHours,
        phrases: &["jenguk pasien", "jam besuk"],
    },
    Rule {
        category: Category::DevTest,
        phrases: &["tes dev"],
    },
    Rule {
        category: Category::ChatDisclaimer,
        phrases: &["disclaimer chat"],
    },
    // Open-ended mental health topics
    Rule {
        category: Category::GeneralInquiry,
        phrases: &["apa", "bagaimana", "gimana", "tanya", "bertanya", "menanyakan"],
    },
    Rule {
        category: Category::DeeperInquiry,
        phrases: &[
            "gejala",
            "mengenali",
            "cara",
            "mendeteksi",
            "membedakan",
            "perbedaan",
            "tanda-tanda",
        ],
    },
    Rule {
        category: Category::Treatment,
        phrases: &[
            "merawat",
            "pengobatan",
            "dosis",
            "obat",
            "sembuh",
            "menyembuhkan",
            "disembuhkan",
        ],
    },
    Rule {
        category: Category::Caregiving,
        phrases: &["perawatan", "kerabat", "keluarga", "obat"],
    },
    Rule {
        category: Category::Farewell,
        phrases: &["terima kasih", "makasih", "sampai jumpa", "selamat tinggal"],
    },
];

/// The rule table, in priority order.
pub fn rules() -> &'static [Rule] {
    RULES
}

/// Why an input landed in its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// Position of the matching rule in [`RULES`]; `None` for the fallback.
    pub rule_index: Option<usize>,
    pub matched_phrase: Option<&'static str>,
}

impl Classification {
    pub fn is_fallback(&self) -> bool {
        self.rule_index.is_none()
    }
}

/// Classify `text` and report which rule and phrase decided it.
pub fn explain(text: &str) -> Classification {
    let lowered = text.to_lowercase();

    for (index, rule) in RULES.iter().enumerate() {
        if let Some(phrase) = rule.find(&lowered) {
            debug!(category = rule.category.id(), phrase, "Input classified");
            return Classification {
                category: rule.category,
                rule_index: Some(index),
                matched_phrase: Some(phrase),
            };
        }
    }

    warn!(
        category = Category::Unrecognized.id(),
        "Input not recognized, falling back to default category"
    );
    Classification {
        category: Category::Unrecognized,
        rule_index: None,
        matched_phrase: None,
    }
}

/// Map free text to a category. Never fails; unmatched input is
/// [`Category::Unrecognized`].
pub fn classify(text: &str) -> Category {
    explain(text).category
}
