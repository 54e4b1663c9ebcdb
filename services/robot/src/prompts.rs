use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Loads every `.md` file in `prompts_path`, keyed by file stem.
pub fn load_prompts(prompts_path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    let entries = fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// The keys in `required` that `prompts` lacks.
pub fn missing_prompts<'a>(
    prompts: &HashMap<String, String>,
    required: &[&'a str],
) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|key| !prompts.contains_key(*key))
        .collect()
}
