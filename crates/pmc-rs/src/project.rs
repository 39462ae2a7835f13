// crates/pmc-rs/src/project.rs
//! Project files: a small JSON file naming one model file per tree.
//!
//! ```json
//! {
//!     "_type": "project",
//!     "paths": {
//!         "parameters": "parameters.json",
//!         "can": "can.json",
//!         ...
//!     }
//! }
//! ```
//!
//! Model paths are relative to the project file's directory. Every file is
//! written to a temporary sibling first and then renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PmError;
use crate::json;
use crate::log::{NodeContext, pm_info};
use crate::model::Model;
use crate::models::Models;
use crate::schema::TreeKind;

const PROJECT_TYPE: &str = "project";

/// Relative path of each model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectPaths {
    pub parameters: PathBuf,
    pub can: PathBuf,
    pub sunspec: PathBuf,
    pub staticmodbus: PathBuf,
    pub anomalies: PathBuf,
}

impl Default for ProjectPaths {
    fn default() -> Self {
        Self {
            parameters: TreeKind::Parameters.default_file_name().into(),
            can: TreeKind::Can.default_file_name().into(),
            sunspec: TreeKind::SunSpec.default_file_name().into(),
            staticmodbus: TreeKind::StaticModbus.default_file_name().into(),
            anomalies: TreeKind::Anomalies.default_file_name().into(),
        }
    }
}

impl ProjectPaths {
    pub fn get(&self, kind: TreeKind) -> &Path {
        match kind {
            TreeKind::Parameters => &self.parameters,
            TreeKind::Can => &self.can,
            TreeKind::SunSpec => &self.sunspec,
            TreeKind::StaticModbus => &self.staticmodbus,
            TreeKind::Anomalies => &self.anomalies,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    #[serde(rename = "_type")]
    kind: String,
    paths: ProjectPaths,
}

#[derive(Debug)]
pub struct Project {
    /// Location of the project file.
    pub path: PathBuf,
    pub paths: ProjectPaths,
    pub models: Models,
}

/// Writes `contents` to a temporary sibling of `path`, then renames it over `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), PmError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    fs::write(&temp, contents).map_err(|e| PmError::io(&temp, e))?;
    fs::rename(&temp, path).map_err(|e| PmError::io(path, e))
}

fn read(path: &Path) -> Result<String, PmError> {
    fs::read_to_string(path).map_err(|e| PmError::io(path, e))
}

impl Project {
    /// An in-memory project with empty trees and default model paths.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            paths: ProjectPaths::default(),
            models: Models::new(),
        }
    }

    /// Creates a new project on disk.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, PmError> {
        let project = Self::new(path);
        project.save()?;
        Ok(project)
    }

    /// Directory model paths are resolved against.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn model_path(&self, kind: TreeKind) -> PathBuf {
        self.directory().join(self.paths.get(kind))
    }

    /// Loads the project file and every model it names. The parameter tree
    /// loads first so the others can be checked against its UUIDs.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PmError> {
        let path = path.into();
        let file: ProjectFile = serde_json::from_str(&read(&path)?)?;
        if file.kind != PROJECT_TYPE {
            return Err(PmError::consistency(format!(
                "{} is a \"{}\" file, not a project",
                path.display(),
                file.kind
            )));
        }
        let mut project = Self {
            path,
            paths: file.paths,
            models: Models::new(),
        };

        let parameters = Model::from_json_string(
            &read(&project.model_path(TreeKind::Parameters))?,
            TreeKind::Parameters,
            &[],
        )?;
        let params = [parameters.tree()];
        let load = |kind: TreeKind| -> Result<Model, PmError> {
            Model::from_json_string(&read(&project.model_path(kind))?, kind, &params)
        };
        let can = load(TreeKind::Can)?;
        let sunspec = load(TreeKind::SunSpec)?;
        let staticmodbus = load(TreeKind::StaticModbus)?;
        let anomalies = load(TreeKind::Anomalies)?;
        project.models = Models {
            parameters,
            can,
            sunspec,
            staticmodbus,
            anomalies,
        };
        project.models.register_drop_sources()?;
        pm_info!(
            NodeContext::new(TreeKind::Parameters, TreeKind::Parameters.root_kind(), project.models.parameters.root()),
            "loaded project {}",
            project.path.display()
        );
        Ok(project)
    }

    /// Writes every model file, then the project file.
    pub fn save(&self) -> Result<(), PmError> {
        for kind in TreeKind::ALL {
            let path = self.model_path(kind);
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|e| PmError::io(dir, e))?;
            }
            write_atomic(&path, &self.models.get(kind).to_json_string()?)?;
        }
        let file = ProjectFile {
            kind: PROJECT_TYPE.to_string(),
            paths: self.paths.clone(),
        };
        write_atomic(&self.path, &json::to_pretty_string(&file)?)
    }

    /// Saves under a new project path; model paths stay relative.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), PmError> {
        self.path = path.into();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeKind;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("device.pmp");
        let mut project = Project::new(&path);
        let root = project.models.parameters.root();
        let group = project
            .models
            .add_child(TreeKind::Parameters, root, NodeKind::Group)
            .expect("group");
        project.save().expect("save");

        let loaded = Project::load(&path).expect("load");
        assert_eq!(loaded.paths, ProjectPaths::default());
        assert!(loaded.models.parameters.tree().contains(group));
        for kind in TreeKind::ALL {
            assert_eq!(
                loaded.models.get(kind).to_json_string().expect("json"),
                project.models.get(kind).to_json_string().expect("json")
            );
        }
        assert!(loaded.models.can.accepts_drops_from(TreeKind::Parameters));
    }

    #[test]
    fn project_file_names_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("p.json");
        Project::create(&path).expect("create");
        let text = std::fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["_type"], "project");
        assert_eq!(value["paths"]["can"], "can.json");
        assert!(dir.path().join("anomalies.json").exists());
        assert!(!dir.path().join("p.json.tmp").exists());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("p.json");
        std::fs::write(
            &path,
            r#"{"_type": "model", "paths": {"parameters": "a", "can": "b", "sunspec": "c", "staticmodbus": "d", "anomalies": "e"}}"#,
        )
        .expect("write");
        assert!(matches!(Project::load(&path), Err(PmError::Consistency(_))));
    }

    #[test]
    fn missing_model_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("p.json");
        let project = Project::create(&path).expect("create");
        std::fs::remove_file(project.model_path(TreeKind::Can)).expect("remove");
        assert!(matches!(Project::load(&path), Err(PmError::Io { .. })));
    }
}
