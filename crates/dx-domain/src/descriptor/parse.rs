use std::collections::BTreeMap;

use indexmap::IndexMap;
use toml_edit::{DocumentMut, Item, TableLike, Value};
use tracing::warn;

use super::{DescriptorError, DevShell, EnvironmentDescriptor, Outputs};
use crate::platform::TargetPlatform;
use crate::request::PackageName;
use crate::source::PackageSource;

const DEV_SHELL_KEYS: [&str; 4] = ["source", "buildInputs", "shellHook", "env"];

pub(super) fn parse_descriptor(
    text: &str,
    origin: &str,
) -> Result<EnvironmentDescriptor, DescriptorError> {
    let doc: DocumentMut = text
        .parse()
        .map_err(|source| DescriptorError::InvalidToml {
            origin: origin.to_string(),
            source,
        })?;
    let inputs = parse_inputs(&doc)?;
    let outputs = doc
        .get("outputs")
        .and_then(Item::as_table_like)
        .ok_or(DescriptorError::MissingField("outputs"))?;
    let systems = parse_systems(outputs)?;
    let dev_shell = parse_dev_shell(outputs, &inputs)?;
    Ok(EnvironmentDescriptor {
        inputs,
        outputs: Outputs { systems, dev_shell },
    })
}

fn parse_inputs(doc: &DocumentMut) -> Result<IndexMap<String, PackageSource>, DescriptorError> {
    let table = doc
        .get("inputs")
        .and_then(Item::as_table_like)
        .ok_or(DescriptorError::MissingField("inputs"))?;
    let mut inputs = IndexMap::new();
    for (name, item) in table.iter() {
        // `name = "<locator>"` or `name.url = "<locator>"`
        let locator = item
            .as_str()
            .or_else(|| {
                item.as_table_like()
                    .and_then(|entry| entry.get("url"))
                    .and_then(Item::as_str)
            })
            .ok_or_else(|| DescriptorError::InvalidField {
                field: format!("inputs.{name}"),
                expected: "a locator string or a table with `url`",
            })?;
        let source =
            PackageSource::new(name, locator).map_err(|source| DescriptorError::InvalidLocator {
                input: name.to_string(),
                locator: locator.to_string(),
                source,
            })?;
        inputs.insert(name.to_string(), source);
    }
    if inputs.is_empty() {
        return Err(DescriptorError::InvalidField {
            field: "inputs".to_string(),
            expected: "a table with at least one input",
        });
    }
    Ok(inputs)
}

fn parse_systems(outputs: &dyn TableLike) -> Result<Vec<TargetPlatform>, DescriptorError> {
    let Some(item) = outputs.get("systems") else {
        return Ok(TargetPlatform::all());
    };
    let array = item
        .as_array()
        .ok_or_else(|| DescriptorError::InvalidField {
            field: "outputs.systems".to_string(),
            expected: "an array of platform strings",
        })?;
    let mut systems = Vec::new();
    for value in array.iter() {
        let raw = value.as_str().ok_or_else(|| DescriptorError::InvalidField {
            field: "outputs.systems".to_string(),
            expected: "an array of platform strings",
        })?;
        let platform = raw
            .trim()
            .parse::<TargetPlatform>()
            .map_err(|_| DescriptorError::UnknownPlatform(raw.to_string()))?;
        if !systems.contains(&platform) {
            systems.push(platform);
        }
    }
    if systems.is_empty() {
        return Err(DescriptorError::InvalidField {
            field: "outputs.systems".to_string(),
            expected: "a non-empty array of platform strings",
        });
    }
    Ok(systems)
}

fn parse_dev_shell(
    outputs: &dyn TableLike,
    inputs: &IndexMap<String, PackageSource>,
) -> Result<DevShell, DescriptorError> {
    let shell = outputs
        .get("devShell")
        .and_then(Item::as_table_like)
        .ok_or(DescriptorError::MissingField("outputs.devShell"))?;
    for (key, _) in shell.iter() {
        if !DEV_SHELL_KEYS.contains(&key) {
            warn!(key, "ignoring unknown key in outputs.devShell");
        }
    }

    let source = match shell.get("source") {
        Some(item) => {
            let name = item.as_str().ok_or_else(|| DescriptorError::InvalidField {
                field: "outputs.devShell.source".to_string(),
                expected: "a string naming an input",
            })?;
            if !inputs.contains_key(name) {
                return Err(DescriptorError::UndeclaredSource(name.to_string()));
            }
            name.to_string()
        }
        None if inputs.len() == 1 => inputs
            .keys()
            .next()
            .cloned()
            .ok_or(DescriptorError::MissingField("inputs"))?,
        None => return Err(DescriptorError::AmbiguousSource(inputs.len())),
    };

    let build_inputs = shell
        .get("buildInputs")
        .ok_or(DescriptorError::MissingField("outputs.devShell.buildInputs"))?
        .as_array()
        .ok_or_else(|| DescriptorError::InvalidField {
            field: "outputs.devShell.buildInputs".to_string(),
            expected: "an array of package names",
        })?
        .iter()
        .map(|value| {
            let raw = value.as_str().ok_or_else(|| DescriptorError::InvalidField {
                field: "outputs.devShell.buildInputs".to_string(),
                expected: "an array of package names",
            })?;
            PackageName::new(raw).map_err(|_| DescriptorError::EmptyPackageName)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let shell_hook = match shell.get("shellHook") {
        Some(item) => Some(
            item.as_str()
                .ok_or_else(|| DescriptorError::InvalidField {
                    field: "outputs.devShell.shellHook".to_string(),
                    expected: "a string",
                })?
                .to_string(),
        ),
        None => None,
    };

    let env = match shell.get("env") {
        Some(item) => parse_env(item)?,
        None => BTreeMap::new(),
    };

    Ok(DevShell {
        source,
        build_inputs,
        env,
        shell_hook,
    })
}

fn parse_env(item: &Item) -> Result<BTreeMap<String, String>, DescriptorError> {
    let table = item
        .as_table_like()
        .ok_or_else(|| DescriptorError::InvalidField {
            field: "outputs.devShell.env".to_string(),
            expected: "a table of strings",
        })?;
    let mut env = BTreeMap::new();
    for (key, value) in table.iter() {
        if !is_env_name(key) {
            return Err(DescriptorError::InvalidField {
                field: format!("outputs.devShell.env.{key}"),
                expected: "keyed by a shell variable name ([A-Za-z_][A-Za-z0-9_]*)",
            });
        }
        let rendered = match value.as_value() {
            Some(Value::String(text)) => text.value().clone(),
            Some(Value::Integer(number)) => number.value().to_string(),
            Some(Value::Boolean(flag)) => flag.value().to_string(),
            _ => {
                return Err(DescriptorError::InvalidField {
                    field: format!("outputs.devShell.env.{key}"),
                    expected: "a string, integer or boolean",
                })
            }
        };
        env.insert(key.to_string(), rendered);
    }
    Ok(env)
}

fn is_env_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(first) if first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
