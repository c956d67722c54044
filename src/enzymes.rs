use crate::{
    error::{OptimizerError, Result},
    restriction_enzyme::RestrictionEnzyme,
};
use std::fs;

const BUILTIN_ENZYMES_JSON: &str = include_str!("../assets/enzymes.json");

#[derive(Clone, Debug)]
pub struct Enzymes {
    restriction_enzymes: Vec<RestrictionEnzyme>,
}

impl Enzymes {
    fn new(json_text: &str) -> Result<Self> {
        let mut ret = Self {
            restriction_enzymes: vec![],
        };
        let res: serde_json::Value = serde_json::from_str(json_text)?;
        let arr = res.as_array().ok_or_else(|| {
            OptimizerError::InvalidEnzymeTable("Enzymes file is not a JSON array".to_string())
        })?;
        for row in arr {
            match row.get("type").and_then(|t| t.as_str()) {
                Some("restriction") => {
                    let mut re: RestrictionEnzyme = serde_json::from_value(row.to_owned())
                        .map_err(|e| {
                            OptimizerError::InvalidEnzymeTable(format!(
                                "Bad restriction enzyme: {row}: {e}"
                            ))
                        })?;
                    re.sequence = re.sequence.to_ascii_uppercase();
                    re.check_palindromic()?;
                    ret.restriction_enzymes.push(re);
                }
                // Proteases and other entries share the REBASE-style file
                Some(_) => continue,
                None => {
                    return Err(OptimizerError::InvalidEnzymeTable(format!(
                        "Missing enzyme type for {row}"
                    )));
                }
            }
        }
        Ok(ret)
    }

    pub fn builtin() -> Result<Self> {
        Self::new(BUILTIN_ENZYMES_JSON)
    }

    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::new(&text)
    }

    pub fn restriction_enzymes(&self) -> &Vec<RestrictionEnzyme> {
        &self.restriction_enzymes
    }

    pub fn find(&self, name: &str) -> Option<&RestrictionEnzyme> {
        self.restriction_enzymes
            .iter()
            .find(|re| re.matches_name(name))
    }
}
