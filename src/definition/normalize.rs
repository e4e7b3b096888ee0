use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

/// Separator that terminates every type namespace, e.g. `data:reads:fastq:`
const TYPE_SEPARATOR: char = ':';

/// Bring a process definition into the shape expected by the validation schema.
///
/// Never fails: anything that isn't shaped the way we expect is left alone and will be reported
/// by validation.
pub fn normalize_process(definition: &mut Value) {
    let Some(process) = definition.as_object_mut() else { return };

    terminate_type(process, "type");
    terminate_type(process, "category");

    if let Some(static_fields) = process.get_mut("static") {
        let mut data_name = None;
        for_each_leaf_field(static_fields, &mut |field| {
            if field.get("name").and_then(Value::as_str) == Some("name") {
                if let Some(default) = field.get("default") {
                    data_name = Some(default.clone());
                }
            }
        });
        if let Some(data_name) = data_name {
            process.insert("data_name".to_string(), data_name);
        }
    }

    if migrate_legacy_identity(process) {
        process.remove("var");
        process.remove("static");
    }

    for section in ["input", "output", "var", "static"] {
        if let Some(fields) = process.get_mut(section) {
            for_each_leaf_field(fields, &mut |field| terminate_type(field, "type"));
        }
    }
}

/// Bring a descriptor schema definition into the shape expected by the validation schema.
///
/// Legacy `static` and `var` lists are appended to `schema`, in that order. Sections that
/// aren't lists stay where they are for validation to reject.
pub fn normalize_descriptor(definition: &mut Value) {
    let Some(descriptor) = definition.as_object_mut() else { return };

    for section in ["static", "var", "schema"] {
        if let Some(fields) = descriptor.get_mut(section) {
            for_each_leaf_field(fields, &mut |field| terminate_type(field, "type"));
        }
    }

    migrate_legacy_identity(descriptor);

    if !descriptor.contains_key("schema") {
        descriptor.insert("schema".to_string(), Value::Array(Vec::new()));
    }
    if !descriptor.get("schema").map_or(false, Value::is_array) {
        return;
    }
    for section in ["static", "var"] {
        if !descriptor.get(section).map_or(false, Value::is_array) {
            continue;
        }
        if let (Some(Value::Array(fields)), Some(Value::Array(schema))) =
            (descriptor.remove(section), descriptor.get_mut("schema"))
        {
            schema.extend(fields);
        }
    }
}

/// Old definitions have no slug: the slug was derived from `name`, and `label` held the
/// human readable name. Returns true if the definition was migrated.
fn migrate_legacy_identity(definition: &mut Map<String, Value>) -> bool {
    if definition.contains_key("slug") {
        return false;
    }
    let Some(name) = definition.get("name").and_then(Value::as_str) else { return false };

    let slug = slugify(&name.replace(':', "-"));
    definition.insert("slug".to_string(), Value::String(slug));
    if let Some(label) = definition.remove("label") {
        definition.insert("name".to_string(), label);
    }
    true
}

fn terminate_type(object: &mut Map<String, Value>, key: &str) {
    if let Some(Value::String(value)) = object.get_mut(key) {
        if !value.ends_with(TYPE_SEPARATOR) {
            value.push(TYPE_SEPARATOR);
        }
    }
}

/// Visit every field that isn't a group, descending into groups
fn for_each_leaf_field<F>(fields: &mut Value, visit: &mut F)
where
    F: FnMut(&mut Map<String, Value>),
{
    let Some(fields) = fields.as_array_mut() else { return };
    for field in fields.iter_mut() {
        let Some(field) = field.as_object_mut() else { continue };
        match field.get_mut("group") {
            Some(group) => for_each_leaf_field(group, visit),
            None => visit(field),
        }
    }
}

/// Lowercase ASCII slug: folds accents (NFKD), drops punctuation, joins words with hyphens
pub fn slugify(value: &str) -> String {
    let kept: String = value
        .nfkd()
        .filter(char::is_ascii)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(kept.len());
    let mut pending_separator = false;
    for c in kept.chars() {
        if c == '-' || c.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator && !slug.is_empty() {
            slug.push('-');
        }
        pending_separator = false;
        slug.push(c);
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
