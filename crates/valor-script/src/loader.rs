//! RON table loader

use crate::error::{Error, Result};
use crate::schema::{
    AttributeCostRow, AttributeCostTable, AttributeDef, ClassDef, LevelRequirement, LevelTable,
    SkillCostRow, SkillCostTable, SkillDef,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use valor_core::{AttributeCode, ClassId, SkillId};

/// Loaded, read-only progression tables
#[derive(Debug, Default)]
pub struct ProgressionDefs {
    /// Recognized attributes, in declaration order
    pub attributes: IndexMap<AttributeCode, AttributeDef>,
    pub attribute_costs: AttributeCostTable,
    pub skills: HashMap<SkillId, SkillDef>,
    pub skill_costs: SkillCostTable,
    pub classes: HashMap<ClassId, ClassDef>,
    pub levels: LevelTable,
}

impl ProgressionDefs {
    /// Parse a single RON document holding every table
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let mut loader = Loader::new();
        loader.load_str(content)?;
        loader.finish()
    }

    pub fn get_attribute(&self, code: &AttributeCode) -> Option<&AttributeDef> {
        self.attributes.get(code)
    }

    pub fn get_skill(&self, id: &SkillId) -> Option<&SkillDef> {
        self.skills.get(id)
    }

    pub fn get_class(&self, id: &ClassId) -> Option<&ClassDef> {
        self.classes.get(id)
    }
}

/// On-disk shape of a table file; every section is optional so tables can
/// be split across files.
#[derive(Deserialize, Default)]
#[serde(default)]
struct TableFile {
    attributes: Vec<AttributeDef>,
    attribute_costs: Vec<AttributeCostRow>,
    skills: Vec<SkillDef>,
    skill_costs: Vec<SkillCostRow>,
    classes: Vec<ClassDef>,
    levels: Vec<LevelRequirement>,
}

/// Loader for RON progression tables
pub struct Loader {
    defs: ProgressionDefs,
    levels: Vec<LevelRequirement>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: ProgressionDefs::default(),
            levels: Vec::new(),
        }
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let content = fs::read_to_string(path)?;
        self.load_str(&content)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let mut paths: Vec<_> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();
        for path in paths {
            self.load_file(path)?;
        }
        Ok(())
    }

    /// Merge tables from a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: TableFile = ron::from_str(content)?;

        for attribute in file.attributes {
            let code = attribute.code.clone();
            if self.defs.attributes.contains_key(&code) {
                return Err(Error::DuplicateDefinition(format!("attribute {}", code)));
            }
            self.defs.attributes.insert(code, attribute);
        }

        for row in file.attribute_costs {
            let point = row.point;
            if !self.defs.attribute_costs.insert(row) {
                return Err(Error::DuplicateDefinition(format!("attribute cost for point {}", point)));
            }
        }

        for skill in file.skills {
            let id = skill.id.clone();
            if skill.max_level == 0 {
                return Err(Error::InvalidSchema(format!("skill {} has max_level 0", id)));
            }
            if self.defs.skills.contains_key(&id) {
                return Err(Error::DuplicateDefinition(format!("skill {}", id)));
            }
            self.defs.skills.insert(id, skill);
        }

        for row in file.skill_costs {
            let level = row.level;
            if !self.defs.skill_costs.insert(row) {
                return Err(Error::DuplicateDefinition(format!("skill cost for level {}", level)));
            }
        }

        for class in file.classes {
            let id = class.id.clone();
            if self.defs.classes.contains_key(&id) {
                return Err(Error::DuplicateDefinition(format!("class {}", id)));
            }
            self.defs.classes.insert(id, class);
        }

        self.levels.extend(file.levels);
        Ok(())
    }

    /// Validate cross-references and produce the tables
    pub fn finish(self) -> Result<ProgressionDefs> {
        let mut defs = self.defs;
        defs.levels = LevelTable::new(self.levels).map_err(Error::InvalidSchema)?;

        for class in defs.classes.values() {
            for entry in &class.skills {
                if !defs.skills.contains_key(&entry.skill) {
                    return Err(Error::InvalidSchema(format!(
                        "class {} pools unknown skill {}",
                        class.id, entry.skill
                    )));
                }
                if entry.max_learnable_level == 0 {
                    return Err(Error::InvalidSchema(format!(
                        "class {} caps skill {} at level 0",
                        class.id, entry.skill
                    )));
                }
            }
        }

        Ok(defs)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
