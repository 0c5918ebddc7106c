//! 网描述的读写：JSON、RON、YAML 与 TOML。
//!
//! 描述格式按名称引用库所，弧既可以写成裸库所名（权重 1），
//! 也可以写成 `{ place, weight }`。
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{Net, NetError};
use crate::net::ids::PlaceId;
use crate::net::structure::{ArcDirection, Place, Transition, Weight};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("ron error: {0}")]
    RonSer(#[from] ron::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported net file extension `{0}`")]
    UnsupportedFormat(String),
    #[error("invalid net: {0}")]
    Net(#[from] NetError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetSpec {
    pub places: Vec<PlaceSpec>,
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSpec {
    pub name: String,
    #[serde(default)]
    pub tokens: Weight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<ArcSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<ArcSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArcSpec {
    Place(String),
    Weighted {
        place: String,
        #[serde(default = "unit_weight")]
        weight: Weight,
    },
}

fn unit_weight() -> Weight {
    1
}

impl ArcSpec {
    fn new(place: &str, weight: Weight) -> Self {
        if weight == 1 {
            ArcSpec::Place(place.to_owned())
        } else {
            ArcSpec::Weighted {
                place: place.to_owned(),
                weight,
            }
        }
    }

    pub fn place(&self) -> &str {
        match self {
            ArcSpec::Place(place) | ArcSpec::Weighted { place, .. } => place,
        }
    }

    pub fn weight(&self) -> Weight {
        match self {
            ArcSpec::Place(_) => 1,
            ArcSpec::Weighted { weight, .. } => *weight,
        }
    }
}

impl NetSpec {
    pub fn build(&self) -> Result<Net, NetError> {
        let mut net = Net::empty();
        for place in &self.places {
            net.add_place(Place::new_with_tokens(place.name.clone(), place.tokens))?;
        }
        for transition in &self.transitions {
            net.add_transition(Transition::new(transition.name.clone()))?;
        }
        for transition in &self.transitions {
            let transition_id = net
                .transition_by_name(&transition.name)
                .ok_or_else(|| NetError::UnknownTransition(transition.name.clone()))?;
            let arcs = transition
                .consumes
                .iter()
                .map(|arc| (arc, ArcDirection::PlaceToTransition))
                .chain(
                    transition
                        .produces
                        .iter()
                        .map(|arc| (arc, ArcDirection::TransitionToPlace)),
                );
            for (arc, direction) in arcs {
                let place_id = net
                    .place_by_name(arc.place())
                    .ok_or_else(|| NetError::UnknownPlace(arc.place().to_owned()))?;
                match direction {
                    ArcDirection::PlaceToTransition => {
                        net.add_input_arc(place_id, transition_id, arc.weight())?
                    }
                    ArcDirection::TransitionToPlace => {
                        net.add_output_arc(place_id, transition_id, arc.weight())?
                    }
                }
            }
        }
        log::debug!(
            "built net with {} places and {} transitions",
            net.places_len(),
            net.transitions_len()
        );
        Ok(net)
    }
}

impl Net {
    pub fn to_spec(&self) -> NetSpec {
        let places = self
            .places
            .iter()
            .map(|place| PlaceSpec {
                name: place.name.clone(),
                tokens: place.tokens,
            })
            .collect();
        let transitions = self
            .transitions
            .iter_enumerated()
            .map(|(id, transition)| {
                let arcs = self.arcs_of(id);
                let to_specs = |set: &[(PlaceId, Weight)]| {
                    set.iter()
                        .map(|&(place, weight)| ArcSpec::new(&self.places[place].name, weight))
                        .collect::<Vec<_>>()
                };
                TransitionSpec {
                    name: transition.name.clone(),
                    consumes: arcs.map(|a| to_specs(a.consumes())).unwrap_or_default(),
                    produces: arcs.map(|a| to_specs(a.produces())).unwrap_or_default(),
                }
            })
            .collect();
        NetSpec {
            places,
            transitions,
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(ron::ser::to_string_pretty(
        value,
        ron::ser::PrettyConfig::default(),
    )?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn from_yaml_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_yaml::from_str(s)?)
}

pub fn from_toml_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(toml::from_str(s)?)
}

/// Reads a net description, picking the format from the file extension.
pub fn read_net<P: AsRef<Path>>(path: P) -> Result<Net, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let spec: NetSpec = match extension.as_str() {
        "json" => from_json_str(&content)?,
        "ron" => from_ron_str(&content)?,
        "yaml" | "yml" => from_yaml_str(&content)?,
        "toml" => from_toml_str(&content)?,
        other => return Err(IoError::UnsupportedFormat(other.to_owned())),
    };
    Ok(spec.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{PlaceId, Tokens, TransitionId};

    const CYCLE_JSON: &str = r#"{
        "places": [{"name": "p1", "tokens": 1}, {"name": "p2"}],
        "transitions": [
            {"name": "t1", "consumes": ["p1"], "produces": [{"place": "p2", "weight": 2}]},
            {"name": "t2", "consumes": [{"place": "p2"}], "produces": ["p1"]}
        ]
    }"#;

    #[test]
    fn json_description_builds_weighted_net() {
        let spec: NetSpec = from_json_str(CYCLE_JSON).unwrap();
        let net = spec.build().unwrap();

        let t1 = TransitionId::new(0);
        let t2 = TransitionId::new(1);
        assert_eq!(net.output_weight(PlaceId::new(1), t1), 2);
        assert_eq!(net.input_weight(PlaceId::new(1), t2), 1);
        assert_eq!(net.initial_marking().get(PlaceId::new(0)), Tokens::Finite(1));

        let exported = net.to_spec();
        assert_eq!(exported.places, spec.places);
        assert_eq!(exported.transitions[1].consumes, vec![ArcSpec::Place("p2".into())]);
        assert_eq!(exported.build().unwrap().to_spec(), exported);
    }

    #[test]
    fn toml_and_yaml_descriptions_agree() {
        let toml_src = r#"
            places = [{ name = "a", tokens = 2 }, { name = "b" }]

            [[transitions]]
            name = "move"
            consumes = ["a"]
            produces = [{ place = "b", weight = 3 }]
        "#;
        let yaml_src = "
places:
  - name: a
    tokens: 2
  - name: b
transitions:
  - name: move
    consumes: [a]
    produces:
      - place: b
        weight: 3
";
        let from_toml: NetSpec = from_toml_str(toml_src).unwrap();
        let from_yaml: NetSpec = from_yaml_str(yaml_src).unwrap();
        assert_eq!(from_toml, from_yaml);
        assert_eq!(from_toml.transitions[0].produces[0].weight(), 3);
    }

    #[test]
    fn ron_description_with_bare_arcs() {
        let ron_src = r#"(
            places: [(name: "p1", tokens: 1), (name: "p2")],
            transitions: [(name: "t1", consumes: ["p1"], produces: ["p2"])],
        )"#;
        let spec: NetSpec = from_ron_str(ron_src).unwrap();
        let net = spec.build().unwrap();
        assert_eq!(net.places_len(), 2);
        assert_eq!(net.output_weight(PlaceId::new(1), TransitionId::new(0)), 1);

        let text = to_ron_string(&net.to_spec()).unwrap();
        assert!(text.contains("\"t1\""));
    }

    #[test]
    fn undeclared_place_is_rejected() {
        let spec = NetSpec {
            places: vec![PlaceSpec {
                name: "p".into(),
                tokens: 0,
            }],
            transitions: vec![TransitionSpec {
                name: "t".into(),
                consumes: vec![ArcSpec::Place("ghost".into())],
                produces: Vec::new(),
            }],
        };
        assert_eq!(
            spec.build().unwrap_err(),
            NetError::UnknownPlace("ghost".into())
        );
    }

    #[test]
    fn zero_weight_arc_is_rejected() {
        let json = r#"{"places": [{"name": "p"}],
            "transitions": [{"name": "t", "produces": [{"place": "p", "weight": 0}]}]}"#;
        let spec: NetSpec = from_json_str(json).unwrap();
        assert!(matches!(spec.build(), Err(NetError::ZeroWeight { .. })));
    }

    #[test]
    fn unknown_extension_is_reported() {
        let err = read_net("net.xml").unwrap_err();
        assert!(matches!(err, IoError::Io(_) | IoError::UnsupportedFormat(_)));
    }
}
