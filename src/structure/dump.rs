//! Requests for snapshots of the beam at given cells.

use super::fst;
use crate::{
    beam::particle::{Particle, ParticleStatus},
    error::{Error, Result},
    kinematics::rad_to_deg,
};
use std::path::Path;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Output format a dump target can be written in.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum DumpFormat {
    /// Whitespace separated columns.
    Text,
    /// Comma separated columns.
    Csv,
}

impl DumpFormat {
    /// Determines the format from the extension of the target file name.
    pub fn from_file_name(file: &str) -> Result<Self> {
        match Path::new(file).extension().and_then(|ext| ext.to_str()) {
            None => Ok(Self::Text),
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "txt" | "dat" | "log" => Ok(Self::Text),
                "csv" => Ok(Self::Csv),
                _ => Err(Error::UnsupportedDumpFormat(ext.to_string())),
            },
        }
    }
}

/// Which particle quantities to include in a dump, and for which particles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DumpRequest {
    /// Name of the target the collaborator should write to.
    pub file: String,
    /// Index of the first particle to include.
    pub n1: usize,
    /// Index of the last particle to include (inclusive).
    pub n2: usize,
    /// Whether to skip lost particles.
    pub live_only: bool,
    /// Whether to include the phase [deg].
    pub phase: bool,
    /// Whether to include the kinetic energy [MeV].
    pub energy: bool,
    /// Whether to include the radial offset [m].
    pub radius: bool,
    /// Whether to include the azimuthal angle [rad].
    pub azimuth: bool,
    /// Whether to include the radial velocity.
    pub vx: bool,
}

impl DumpRequest {
    /// Requests every quantity of every particle.
    pub fn all(file: &str) -> Self {
        DumpRequest {
            file: file.to_string(),
            n1: 0,
            n2: usize::MAX,
            live_only: false,
            phase: true,
            energy: true,
            radius: true,
            azimuth: true,
            vx: true,
        }
    }

    /// Checks that the request can be honoured.
    pub fn validate(&self) -> Result<DumpFormat> {
        if self.n1 > self.n2 {
            return Err(Error::InvalidDump {
                file: self.file.clone(),
                message: format!("first index {} exceeds last index {}", self.n1, self.n2),
            });
        }
        if self.file.trim().is_empty() {
            return Err(Error::InvalidDump {
                file: self.file.clone(),
                message: "target name is empty".to_string(),
            });
        }
        DumpFormat::from_file_name(&self.file)
    }

    /// Extracts the requested subset of the ensemble.
    ///
    /// # Parameters
    ///
    /// - `particles`: The full ensemble.
    /// - `wavelength`: RF wavelength [m] for converting radial offsets.
    pub fn select(&self, particles: &[Particle], wavelength: fst) -> Vec<DumpedParticle> {
        particles
            .iter()
            .enumerate()
            .skip(self.n1)
            .take_while(|(idx, _)| *idx <= self.n2)
            .filter(|(_, particle)| !self.live_only || particle.is_alive())
            .map(|(index, particle)| DumpedParticle {
                index,
                status: particle.status(),
                phase: self.phase.then(|| rad_to_deg(particle.phi)),
                energy: self.energy.then(|| particle.energy()),
                radius: self.radius.then(|| particle.radius(wavelength)),
                azimuth: self.azimuth.then(|| particle.th),
                vx: self.vx.then(|| particle.radial_velocity()),
            })
            .collect()
    }
}

/// A dump request attached to a cell, with its output format resolved.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CellDump {
    pub request: DumpRequest,
    pub format: DumpFormat,
}

impl CellDump {
    /// Validates the request and determines its format.
    pub fn resolve(request: &DumpRequest) -> Result<Self> {
        let format = request.validate()?;
        Ok(CellDump {
            request: request.clone(),
            format,
        })
    }
}

/// Requested quantities of one particle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DumpedParticle {
    /// Index of the particle in the ensemble.
    pub index: usize,
    pub status: ParticleStatus,
    pub phase: Option<fst>,
    pub energy: Option<fst>,
    pub radius: Option<fst>,
    pub azimuth: Option<fst>,
    pub vx: Option<fst>,
}
