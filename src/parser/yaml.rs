use super::types::{Feature, Keyword, Scenario, Step};
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Parse a YAML feature file
pub fn parse_feature_file(path: &Path) -> Result<Feature> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let mut feature = parse_feature_content(&content)
        .with_context(|| format!("Invalid feature file: {}", path.display()))?;
    if feature.name.is_empty() {
        feature.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
    }
    feature.source = Some(path.to_path_buf());
    Ok(feature)
}

/// Parse YAML content into a Feature
///
/// ```yaml
/// feature: Sign in
/// tags: ["@signin"]
/// background:
///   - Given I open the Yuba homepage
/// scenarios:
///   - name: Sign in with valid credentials
///     steps:
///       - When I click the Sign In button
///       - then: I should be signed in successfully
/// ```
pub fn parse_feature_content(content: &str) -> Result<Feature> {
    let value: Value = serde_yaml::from_str(content).context("Failed to parse YAML content")?;

    let map = match value {
        Value::Mapping(map) => map,
        _ => anyhow::bail!("Invalid feature format: expected a mapping with 'feature' and 'scenarios'"),
    };

    let mut feature = Feature {
        name: get_str(&map, "feature")
            .or_else(|| get_str(&map, "name"))
            .unwrap_or_default(),
        description: get_str(&map, "description"),
        tags: get_tags(&map)?,
        category: get_str(&map, "category"),
        ..Default::default()
    };

    if let Some(val) = get(&map, "background") {
        feature.background = parse_steps(val).context("Invalid background")?;
    }

    let scenarios = match get(&map, "scenarios") {
        Some(Value::Sequence(seq)) => seq,
        Some(_) => anyhow::bail!("'scenarios' must be a list"),
        None => anyhow::bail!("Feature has no 'scenarios'"),
    };

    for (index, item) in scenarios.iter().enumerate() {
        let scenario = parse_scenario(item, &feature.background)
            .with_context(|| format!("Invalid scenario #{}", index + 1))?;
        feature.scenarios.push(scenario);
    }

    Ok(feature)
}

fn parse_scenario(value: &Value, background: &[Step]) -> Result<Scenario> {
    let map = value
        .as_mapping()
        .ok_or_else(|| anyhow::anyhow!("Scenario must be a mapping"))?;

    let name = get_str(map, "name")
        .or_else(|| get_str(map, "scenario"))
        .ok_or_else(|| anyhow::anyhow!("Scenario is missing 'name'"))?;

    let mut steps = background.to_vec();
    if let Some(val) = get(map, "steps") {
        steps.extend(parse_steps(val)?);
    }

    Ok(Scenario {
        name,
        tags: get_tags(map)?,
        category: get_str(map, "category"),
        steps,
    })
}

fn parse_steps(value: &Value) -> Result<Vec<Step>> {
    match value {
        Value::Sequence(seq) => seq.iter().map(parse_step_value).collect(),
        Value::Null => Ok(Vec::new()),
        _ => anyhow::bail!("Steps must be a list"),
    }
}

/// Parse one step: `"Given some text"` or `{given: "some text"}`
pub fn parse_step_value(value: &Value) -> Result<Step> {
    match value {
        Value::String(s) => parse_step_line(s),

        Value::Mapping(map) => {
            if map.len() != 1 {
                anyhow::bail!("Invalid step format: expected single key mapping");
            }
            let (key, text) = map
                .iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("Empty step mapping"))?;
            let keyword: Keyword = key
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Step keyword must be a string"))?
                .parse()?;
            let text = text
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Step text for '{}' must be a string", keyword))?;
            Ok(Step::new(keyword, text.trim()))
        }

        _ => anyhow::bail!("Invalid step format: {:?}", value),
    }
}

fn parse_step_line(line: &str) -> Result<Step> {
    let line = line.trim();
    let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let keyword: Keyword = first
        .parse()
        .with_context(|| format!("Step must start with Given/When/Then/And/But: '{}'", line))?;
    let text = rest.trim();
    if text.is_empty() {
        anyhow::bail!("Step '{}' has no text", line);
    }
    Ok(Step::new(keyword, text))
}

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(&Value::String(key.to_string()))
}

fn get_str(map: &Mapping, key: &str) -> Option<String> {
    get(map, key).and_then(Value::as_str).map(str::to_string)
}

fn get_tags(map: &Mapping) -> Result<Vec<String>> {
    match get(map, "tags") {
        Some(Value::String(s)) => Ok(s.split_whitespace().map(str::to_string).collect()),
        Some(val) => serde_yaml::from_value(val.clone()).context("'tags' must be a list of strings"),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature() {
        let yaml = r#"
feature: Yuba Sign In
tags: ["@signin"]
background:
  - Given Open Yuba homepage
scenarios:
  - name: Sign in with valid credentials
    steps:
      - When Click Sign In button
      - And Enter email "${YUBA_EMAIL}"
      - then: I should be signed in
  - name: Dashboard loading time
    tags: "@performance @dashboard"
    category: Performance
    steps:
      - Then Track dashboard loading time
"#;

        let feature = parse_feature_content(yaml).unwrap();
        assert_eq!(feature.name, "Yuba Sign In");
        assert_eq!(feature.tags, vec!["@signin"]);
        assert_eq!(feature.scenarios.len(), 2);

        let first = &feature.scenarios[0];
        assert_eq!(first.steps.len(), 4);
        assert_eq!(first.steps[0], Step::new(Keyword::Given, "Open Yuba homepage"));
        assert_eq!(first.steps[2].text, "Enter email \"${YUBA_EMAIL}\"");
        assert_eq!(first.steps[3].keyword, Keyword::Then);

        let second = &feature.scenarios[1];
        assert_eq!(second.tags, vec!["@performance", "@dashboard"]);
        assert_eq!(second.category.as_deref(), Some("Performance"));
        assert_eq!(second.steps.len(), 2);
    }

    #[test]
    fn test_invalid_steps_are_rejected() {
        assert!(parse_step_value(&Value::String("Open the homepage".to_string())).is_err());
        assert!(parse_step_value(&Value::String("Given".to_string())).is_err());

        let yaml = "feature: x\nscenarios:\n  - steps: [Given a]\n";
        assert!(parse_feature_content(yaml).is_err());
        assert!(parse_feature_content("- Given a").is_err());
    }

    #[test]
    fn test_parse_file_defaults_name_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web_form.yaml");
        std::fs::write(
            &path,
            "scenarios:\n  - name: Submit\n    steps:\n      - Given I am on the Selenium web form page\n",
        )
        .unwrap();

        let feature = parse_feature_file(&path).unwrap();
        assert_eq!(feature.name, "web_form");
        assert_eq!(feature.source.as_deref(), Some(path.as_path()));
    }
}
