use crate::models::RankingType;

/// Deployment roots the bundle has been served from, most common first.
pub const DEFAULT_PATH_TEMPLATES: [&str; 6] = [
    "./assets/data/{lang}/{type}.json",
    "/assets/data/{lang}/{type}.json",
    "assets/data/{lang}/{type}.json",
    "./data/{lang}/{type}.json",
    "/data/{lang}/{type}.json",
    "data/{lang}/{type}.json",
];

/// Expands path templates into the ordered candidate list for one dataset.
#[derive(Debug, Clone)]
pub struct PathResolver {
    templates: Vec<String>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_TEMPLATES.iter().map(|t| t.to_string()))
    }
}

impl PathResolver {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends deployment-specific templates after the existing ones.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Candidate paths in template order, duplicates after substitution dropped.
    pub fn candidates(&self, language: &str, ranking: RankingType) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.templates.len());
        for template in &self.templates {
            let path = template
                .replace("{lang}", language)
                .replace("{type}", ranking.as_str());
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_templates_expand_in_order() {
        let paths = PathResolver::default().candidates("en", RankingType::Monthly);
        assert_eq!(paths.len(), 6);
        assert_eq!(paths[0], "./assets/data/en/monthly_rank.json");
        assert_eq!(paths[1], "/assets/data/en/monthly_rank.json");
        assert_eq!(paths[5], "data/en/monthly_rank.json");
    }

    #[test]
    fn extra_templates_are_appended() {
        let resolver = PathResolver::new(["{lang}/{type}.json"])
            .with_extra(["/mirror/{lang}/{type}.json", "{lang}/{type}.json"]);
        assert_eq!(
            resolver.candidates("zh", RankingType::Region),
            vec!["zh/region_rank.json", "/mirror/zh/region_rank.json"]
        );
    }
}
