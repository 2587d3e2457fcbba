pub const DEFAULT_API_URL: &str = "https://quiver-dev.sub.uni-goettingen.de/api";
pub const DEFAULT_DATA_URL: &str = "https://raw.githubusercontent.com/OCR-D/quiver-back-end/main/data";

/// Request URLs of the evaluation API and the static catalog data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_url: String,
    data_url: String,
}

impl Endpoints {
    pub fn new(api_url: &str, data_url: &str) -> Self {
        Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            data_url: data_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn ground_truth(&self) -> String {
        format!("{}/gt", self.api_url)
    }

    pub fn workflows(&self) -> String {
        format!("{}/workflows", self.api_url)
    }

    pub fn runs(&self, gt_id: Option<&str>, workflow_id: Option<&str>) -> String {
        let mut path = format!("{}/runs", self.api_url);
        for segment in [gt_id, workflow_id].into_iter().flatten() {
            if !segment.is_empty() {
                path.push('/');
                path.push_str(segment);
            }
        }
        path
    }

    pub fn latest_runs(&self, gt_id: Option<&str>, workflow_id: Option<&str>) -> String {
        format!("{}/latest", self.runs(gt_id, workflow_id))
    }

    pub fn projects(&self) -> String {
        format!("{}/repos.json", self.data_url)
    }

    pub fn releases(&self) -> String {
        format!("{}/ocrd_all_releases.json", self.data_url)
    }

    pub fn metric_definitions(&self) -> String {
        format!("{}/metrics_definitions.json", self.data_url)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_DATA_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::Endpoints;

    #[test]
    fn run_paths_append_optional_segments() {
        let endpoints = Endpoints::new("https://quiver.example/api/", "https://data.example");

        assert_eq!(endpoints.runs(None, None), "https://quiver.example/api/runs");
        assert_eq!(
            endpoints.runs(Some("16_ant_complex"), None),
            "https://quiver.example/api/runs/16_ant_complex"
        );
        assert_eq!(
            endpoints.runs(Some("16_ant_complex"), Some("minimal_ocr")),
            "https://quiver.example/api/runs/16_ant_complex/minimal_ocr"
        );
        assert_eq!(
            endpoints.latest_runs(Some("16_ant_complex"), Some("")),
            "https://quiver.example/api/runs/16_ant_complex/latest"
        );
        assert_eq!(
            endpoints.latest_runs(None, None),
            "https://quiver.example/api/runs/latest"
        );
    }

    #[test]
    fn catalog_paths_use_data_url() {
        let endpoints = Endpoints::default();
        assert!(endpoints.projects().ends_with("/data/repos.json"));
        assert!(endpoints.releases().ends_with("/data/ocrd_all_releases.json"));
        assert!(
            endpoints
                .metric_definitions()
                .ends_with("/data/metrics_definitions.json")
        );
        assert_eq!(
            endpoints.ground_truth(),
            "https://quiver-dev.sub.uni-goettingen.de/api/gt"
        );
        assert_eq!(
            endpoints.workflows(),
            "https://quiver-dev.sub.uni-goettingen.de/api/workflows"
        );
    }
}
