//! Package-installation requirements.
//!
//! A requirement declares packages to install during container image
//! construction, polymorphic over the package-manager family. Each variant
//! renders an ordered list of install-command strings; the engine layer only
//! sequences, indents, and conditionally includes them.

use crate::escape::shell_quote;
use serde::{Deserialize, Serialize};

/// A declarative package-installation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Requirement {
    /// Debian/Ubuntu packages via apt-get
    Apt {
        /// Packages to install
        packages: Vec<String>,
    },
    /// Alpine packages via apk
    Apk {
        /// Packages to install
        packages: Vec<String>,
    },
    /// RHEL-family packages via yum
    Yum {
        /// Packages to install
        packages: Vec<String>,
    },
    /// Python packages via pip
    Pip {
        /// Packages to install
        packages: Vec<String>,
    },
    /// R packages from CRAN
    R {
        /// Packages to install
        packages: Vec<String>,
    },
    /// Raw shell commands run as-is
    Bash {
        /// Commands to run, in order
        commands: Vec<String>,
    },
}

impl Requirement {
    /// Render the ordered list of install commands for this requirement.
    #[must_use]
    pub fn install_commands(&self) -> Vec<String> {
        match self {
            Self::Apt { packages } => {
                if packages.is_empty() {
                    return Vec::new();
                }
                vec![
                    "apt-get update".to_string(),
                    format!(
                        "DEBIAN_FRONTEND=noninteractive apt-get install -y {}",
                        quote_join(packages)
                    ),
                ]
            }
            Self::Apk { packages } => {
                if packages.is_empty() {
                    return Vec::new();
                }
                vec![format!("apk add --no-cache {}", quote_join(packages))]
            }
            Self::Yum { packages } => {
                if packages.is_empty() {
                    return Vec::new();
                }
                vec![format!("yum install -y {}", quote_join(packages))]
            }
            Self::Pip { packages } => {
                if packages.is_empty() {
                    return Vec::new();
                }
                vec![
                    "pip install --upgrade pip".to_string(),
                    format!("pip install --no-cache-dir {}", quote_join(packages)),
                ]
            }
            Self::R { packages } => {
                if packages.is_empty() {
                    return Vec::new();
                }
                let quoted: Vec<String> = packages.iter().map(|p| format!("\"{p}\"")).collect();
                vec![format!(
                    "Rscript -e 'install.packages(c({}), repos = \"https://cran.r-project.org\")'",
                    quoted.join(", ")
                )]
            }
            Self::Bash { commands } => commands.clone(),
        }
    }
}

fn quote_join(packages: &[String]) -> String {
    packages
        .iter()
        .map(|p| shell_quote(p))
        .collect::<Vec<_>>()
        .join(" ")
}
