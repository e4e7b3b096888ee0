use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde_json::Value;

use crate::definition::DefinitionKind;

/// Find definitions of one kind under `schema_path`
///
/// Files that can't be read or parsed are reported and skipped. With non-empty `filters`,
/// only definitions whose slug or name is listed are kept.
pub fn find_schemas(schema_path: &Path, filters: Option<&[String]>, kind: DefinitionKind) -> Vec<Value> {
    if !schema_path.is_dir() {
        info!("Invalid path {}", schema_path.display());
        return Vec::new();
    }

    let files = get_yaml_paths(schema_path);
    let filters = filters.filter(|filters| !filters.is_empty());

    let mut matches = Vec::new();
    for file in files {
        let Some(definitions) = read_yaml_list(&file) else {
            error!("Could not read YAML file {}", file.display());
            continue;
        };

        for definition in definitions {
            if !definition.is_object() {
                continue;
            }
            if let Some(filters) = filters {
                if !matches_filter(&definition, filters) {
                    continue;
                }
            }
            if definition.get(kind.marker_key()).is_none() {
                continue;
            }
            matches.push(definition);
        }
    }

    debug!("Found {} {} definitions in {}", matches.len(), kind, schema_path.display());
    matches
}

fn matches_filter(definition: &Value, filters: &[String]) -> bool {
    ["slug", "name"].iter().any(|key| {
        definition
            .get(*key)
            .and_then(Value::as_str)
            .map_or(false, |value| filters.iter().any(|filter| filter == value))
    })
}

/// Parse a YAML file holding a list of definitions. None if it's unreadable, empty, or not a list.
fn read_yaml_list(path: &Path) -> Option<Vec<Value>> {
    debug!("Reading definitions from {}", path.display());
    let text = fs::read_to_string(path).ok()?;
    match serde_yaml::from_str::<Value>(&text) {
        Ok(Value::Array(definitions)) if !definitions.is_empty() => Some(definitions),
        _ => None,
    }
}

/// All `.yml`/`.yaml` files below `dir`, walked in sorted order. Directories that can't be
/// listed are reported and left out.
fn get_yaml_paths(dir: &Path) -> Vec<PathBuf> {
    let mut entries = match list_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            error!("Can't list {}: {}", dir.display(), err);
            return Vec::new();
        }
    };
    entries.sort();

    let mut paths = Vec::new();
    for path in entries {
        if path.is_dir() {
            paths.extend(get_yaml_paths(&path));
        } else if is_yaml(&path) {
            paths.push(path);
        }
    }
    paths
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, io::Error> {
    fs::read_dir(dir)?
        .map(|res| res.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, io::Error>>()
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .map_or(false, |ext| ext == "yml" || ext == "yaml")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PROCESSES: &str = "\
- slug: align
  name: Align reads
  run:
    program: bowtie2
- slug: sample
  name: Sample
  schema: []
";

    fn slugs(definitions: &[Value]) -> Vec<&str> {
        definitions.iter().map(|d| d["slug"].as_str().unwrap()).collect()
    }

    #[test]
    fn picks_definitions_by_marker_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("defs.YAML"), PROCESSES).unwrap();
        fs::write(dir.path().join("notes.txt"), PROCESSES).unwrap();

        let processes = find_schemas(dir.path(), None, DefinitionKind::Process);
        assert_eq!(slugs(&processes), vec!["align"]);

        let descriptors = find_schemas(dir.path(), None, DefinitionKind::Descriptor);
        assert_eq!(slugs(&descriptors), vec!["sample"]);
    }

    #[test]
    fn filters_by_slug_or_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), PROCESSES).unwrap();
        fs::write(
            dir.path().join("b.yml"),
            "- slug: quant\n  name: Quantify\n  run: {program: salmon}\n",
        )
        .unwrap();

        let by_name = ["Quantify".to_string()];
        let found = find_schemas(dir.path(), Some(&by_name[..]), DefinitionKind::Process);
        assert_eq!(slugs(&found), vec!["quant"]);

        let by_slug = ["align".to_string(), "missing".to_string()];
        let found = find_schemas(dir.path(), Some(&by_slug[..]), DefinitionKind::Process);
        assert_eq!(slugs(&found), vec!["align"]);
    }

    #[test]
    fn empty_filter_list_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), PROCESSES).unwrap();
        fs::write(
            dir.path().join("b.yml"),
            "- slug: quant\n  name: Quantify\n  run: {program: salmon}\n",
        )
        .unwrap();

        let no_filters: Vec<String> = Vec::new();
        let found = find_schemas(dir.path(), Some(no_filters.as_slice()), DefinitionKind::Process);
        assert_eq!(slugs(&found), vec!["align", "quant"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_does_not_hide_its_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.yml"), PROCESSES).unwrap();
        fs::write(dir.path().join("z.yml"), "- slug: quant\n  name: Quantify\n  run: {program: salmon}\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let found = find_schemas(dir.path(), None, DefinitionKind::Process);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // root can still list the locked directory
        let found = slugs(&found);
        assert_eq!(found.last(), Some(&"quant"));
        assert!(found.len() <= 2);
    }

    #[test]
    fn skips_broken_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), "- slug: [unterminated\n").unwrap();
        fs::write(dir.path().join("b.yml"), "").unwrap();
        fs::write(dir.path().join("c.yml"), "slug: not-a-list\n").unwrap();
        fs::write(dir.path().join("d.yml"), PROCESSES).unwrap();

        let found = find_schemas(dir.path(), None, DefinitionKind::Process);
        assert_eq!(slugs(&found), vec!["align"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_schemas(&dir.path().join("nope"), None, DefinitionKind::Process).is_empty());
    }
}
