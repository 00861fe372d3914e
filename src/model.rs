use serde::{Deserialize, Serialize};

/// One shipment record. Dates are kept as the strings they were entered
/// with; `dates::parse_loose` turns them into timestamps when a report
/// needs them. An empty string means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub year: String,
    pub job_no: String,
    #[serde(default)]
    pub importer: String,
    #[serde(default)]
    pub ie_code_no: String,
    #[serde(default)]
    pub custom_house: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detailed_status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub be_no: String,
    #[serde(default)]
    pub be_date: String,
    #[serde(default)]
    pub out_of_charge: String,
    #[serde(default)]
    pub discharge_date: String,
    #[serde(default)]
    pub container_nos: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub container_number: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub arrival_date: String,
    #[serde(default)]
    pub container_rail_out_date: String,
    #[serde(default)]
    pub delivery_date: String,
    #[serde(default)]
    pub detention_from: String,
    #[serde(default)]
    pub do_validity_upto_container_level: String,
    #[serde(default, rename = "emptyContainerOffLoadDate")]
    pub empty_container_off_load_date: String,
    #[serde(default)]
    pub rms: String,
}

impl Job {
    pub fn is_completed(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("completed")
    }
}

/// Row filter for loading jobs out of the store.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub year: String,
    pub importer: Option<String>,
    pub ie_code: Option<String>,
}

impl JobFilter {
    pub fn year(year: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            ..Self::default()
        }
    }

    pub fn with_importer(mut self, importer: Option<String>) -> Self {
        self.importer = importer;
        self
    }

    pub fn with_ie_code(mut self, ie_code: Option<String>) -> Self {
        self.ie_code = ie_code;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImporterSummary {
    pub importer: String,
    pub ie_code_no: String,
    pub job_count: i64,
}
