//! Starter descriptor written by `dx init`.

use toml_edit::{Array, DocumentMut, Item, Table, Value as TomlValue};

use crate::platform::TargetPlatform;

pub const DEFAULT_SNAPSHOT: &str = "github:NixOS/nixpkgs/nixos-24.05";

pub const PYTHON_TOOLS: [&str; 6] = [
    "python3",
    "python3Packages.pip",
    "python3Packages.setuptools",
    "python3Packages.black",
    "python3Packages.flake8",
    "python3Packages.isort",
];

/// Renders a descriptor for a Python development shell pinned to `snapshot`.
#[must_use]
pub fn python_shell_descriptor(snapshot: &str) -> String {
    let mut doc = DocumentMut::new();

    let mut inputs = Table::new();
    inputs["nixpkgs"] = Item::Value(TomlValue::from(snapshot));
    doc.as_table_mut().insert("inputs", Item::Table(inputs));

    let mut systems = Array::new();
    for platform in TargetPlatform::all() {
        systems.push(platform.to_string());
    }

    let mut build_inputs = Array::new();
    for tool in PYTHON_TOOLS {
        build_inputs.push(tool);
    }
    for value in build_inputs.iter_mut() {
        value.decor_mut().set_prefix("\n  ");
    }
    build_inputs.set_trailing("\n");
    build_inputs.set_trailing_comma(true);

    let mut dev_shell = Table::new();
    dev_shell["source"] = Item::Value(TomlValue::from("nixpkgs"));
    dev_shell["buildInputs"] = Item::Value(TomlValue::Array(build_inputs));

    let mut outputs = Table::new();
    outputs["systems"] = Item::Value(TomlValue::Array(systems));
    outputs.insert("devShell", Item::Table(dev_shell));
    doc.as_table_mut().insert("outputs", Item::Table(outputs));

    doc.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EnvironmentDescriptor;

    #[test]
    fn template_round_trips_through_the_parser() {
        let descriptor = EnvironmentDescriptor::parse(&python_shell_descriptor(DEFAULT_SNAPSHOT))
            .expect("template parses");
        assert_eq!(descriptor.tool_request().len(), PYTHON_TOOLS.len());
        assert_eq!(descriptor.outputs.systems.len(), 4);
    }

    #[test]
    fn snapshot_with_quotes_and_backslashes_is_escaped() {
        let snapshot = r#"path:/srv/a"b\c"#;
        let rendered = python_shell_descriptor(snapshot);
        let descriptor = EnvironmentDescriptor::parse(&rendered).expect("template parses");
        assert_eq!(descriptor.shell_source().locator.to_string(), snapshot);
    }
}
