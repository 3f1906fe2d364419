// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

pub mod xml;

/// Namespace of UncertML 2.0 documents.
pub const NAMESPACE: &str = "http://www.uncertml.org/2.0";

/// Location of the UncertML 2.0 XML schema.
pub const SCHEMA_LOCATION: &str = "http://52north.org/schema/geostatistics/uncertweb/Schema/uncertml/uncertml2.xsd";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed UncertML document: {0}")]
    Xml(String),
    #[error("element '{0}' is not in the UncertML namespace")]
    Namespace(String),
    #[error("unknown UncertML type '{0}'")]
    UnknownType(String),
    #[error("unexpected element '{0}'")]
    UnexpectedElement(String),
    #[error("{kind} is missing parameter '{parameter}'")]
    MissingParameter { kind: String, parameter: String },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// An UncertML value: a parametric distribution or a summary statistic.
///
/// Every parameter is a list so that the same type also describes
/// multivariate (independent) quantities. The serde representation is the
/// UncertML JSON encoding, e.g. `{"NormalDistribution": {"mean": [1.0], "variance": [0.5]}}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Uncertainty {
    NormalDistribution {
        mean: Vec<f64>,
        variance: Vec<f64>,
    },
    LogNormalDistribution {
        #[serde(rename = "logScale")]
        log_scale: Vec<f64>,
        shape: Vec<f64>,
    },
    UniformDistribution {
        minimum: Vec<f64>,
        maximum: Vec<f64>,
    },
    ExponentialDistribution {
        rate: Vec<f64>,
    },
    Mean {
        values: Vec<f64>,
    },
    Variance {
        values: Vec<f64>,
    },
    StandardDeviation {
        values: Vec<f64>,
    },
}

/// Names of all the concrete UncertML types known to this library.
pub const KINDS: [&str; 7] = [
    "NormalDistribution",
    "LogNormalDistribution",
    "UniformDistribution",
    "ExponentialDistribution",
    "Mean",
    "Variance",
    "StandardDeviation",
];

impl Uncertainty {
    /// UncertML type name, which is also the local name of the XML element.
    pub fn kind(&self) -> &'static str {
        match self {
            Uncertainty::NormalDistribution { .. } => "NormalDistribution",
            Uncertainty::LogNormalDistribution { .. } => "LogNormalDistribution",
            Uncertainty::UniformDistribution { .. } => "UniformDistribution",
            Uncertainty::ExponentialDistribution { .. } => "ExponentialDistribution",
            Uncertainty::Mean { .. } => "Mean",
            Uncertainty::Variance { .. } => "Variance",
            Uncertainty::StandardDeviation { .. } => "StandardDeviation",
        }
    }

    pub fn is_distribution(&self) -> bool {
        self.kind().ends_with("Distribution")
    }

    /// Parameters in document order.
    pub fn parameters(&self) -> Vec<(&'static str, &[f64])> {
        match self {
            Uncertainty::NormalDistribution { mean, variance } => vec![("mean", mean.as_slice()), ("variance", variance.as_slice())],
            Uncertainty::LogNormalDistribution { log_scale, shape } => vec![("logScale", log_scale.as_slice()), ("shape", shape.as_slice())],
            Uncertainty::UniformDistribution { minimum, maximum } => vec![("minimum", minimum.as_slice()), ("maximum", maximum.as_slice())],
            Uncertainty::ExponentialDistribution { rate } => vec![("rate", rate.as_slice())],
            Uncertainty::Mean { values } | Uncertainty::Variance { values } | Uncertainty::StandardDeviation { values } => {
                vec![("values", values.as_slice())]
            }
        }
    }

    /// Build a value from its type name and named parameters. Unknown
    /// parameters are ignored.
    pub fn from_parameters(kind: &str, mut parameters: std::collections::HashMap<String, Vec<f64>>) -> Result<Self, Error> {
        let mut take = |name: &str| {
            parameters.remove(name).ok_or_else(|| Error::MissingParameter {
                kind: kind.to_string(),
                parameter: name.to_string(),
            })
        };
        Ok(match kind {
            "NormalDistribution" => Uncertainty::NormalDistribution {
                mean: take("mean")?,
                variance: take("variance")?,
            },
            "LogNormalDistribution" => Uncertainty::LogNormalDistribution {
                log_scale: take("logScale")?,
                shape: take("shape")?,
            },
            "UniformDistribution" => Uncertainty::UniformDistribution {
                minimum: take("minimum")?,
                maximum: take("maximum")?,
            },
            "ExponentialDistribution" => Uncertainty::ExponentialDistribution { rate: take("rate")? },
            "Mean" => Uncertainty::Mean { values: take("values")? },
            "Variance" => Uncertainty::Variance { values: take("values")? },
            "StandardDeviation" => Uncertainty::StandardDeviation { values: take("values")? },
            _ => return Err(Error::UnknownType(kind.to_string())),
        })
    }
}

pub fn to_json(value: &Uncertainty) -> Result<serde_json::Value, Error> {
    Ok(serde_json::to_value(value)?)
}

pub fn from_json(value: serde_json::Value) -> Result<Uncertainty, Error> {
    Ok(serde_json::from_value(value)?)
}
