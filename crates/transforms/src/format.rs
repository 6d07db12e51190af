use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input extensions the external converter understands, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["dwg", "dxf"];

#[derive(Debug, Error)]
#[error("unknown output format code: '{0}'")]
pub struct UnknownFormat(pub String);

/// AutoCAD release a drawing is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcadVersion {
	V2023,
	V2020,
	V2018,
	V2017,
	V2013,
	V2010,
	V2007,
	V2004,
	V2000,
	R14,
	R12,
}

impl AcadVersion {
	/// Newest first.
	pub const ALL: [Self; 11] = [
		Self::V2023,
		Self::V2020,
		Self::V2018,
		Self::V2017,
		Self::V2013,
		Self::V2010,
		Self::V2007,
		Self::V2004,
		Self::V2000,
		Self::R14,
		Self::R12,
	];

	/// Suffix used in converter format codes, `ACAD2007` or `ACAD14`.
	#[must_use]
	pub const fn code(self) -> &'static str {
		match self {
			Self::V2023 => "2023",
			Self::V2020 => "2020",
			Self::V2018 => "2018",
			Self::V2017 => "2017",
			Self::V2013 => "2013",
			Self::V2010 => "2010",
			Self::V2007 => "2007",
			Self::V2004 => "2004",
			Self::V2000 => "2000",
			Self::R14 => "14",
			Self::R12 => "12",
		}
	}

	#[must_use]
	pub const fn label(self) -> &'static str {
		match self {
			Self::R14 => "R14",
			Self::R12 => "R12",
			other => other.code(),
		}
	}

	fn from_code(code: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|version| version.code() == code)
	}
}

/// Output format handed to the external converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetFormat {
	Dwg(AcadVersion),
	Dxf(AcadVersion),
}

impl TargetFormat {
	/// Every supported target, DWG ones first.
	pub fn all() -> impl Iterator<Item = Self> {
		AcadVersion::ALL
			.into_iter()
			.map(Self::Dwg)
			.chain(AcadVersion::ALL.into_iter().map(Self::Dxf))
	}

	/// Converter argument, e.g. `ACAD2007` or `DXF14`.
	#[must_use]
	pub fn code(self) -> String {
		match self {
			Self::Dwg(version) => format!("ACAD{}", version.code()),
			Self::Dxf(version) => format!("DXF{}", version.code()),
		}
	}

	/// Human readable name, e.g. `AutoCAD 2007 DWG`.
	#[must_use]
	pub fn label(self) -> String {
		match self {
			Self::Dwg(version) => format!("AutoCAD {} DWG", version.label()),
			Self::Dxf(version) => format!("AutoCAD {} DXF", version.label()),
		}
	}

	/// Extension of the file the converter writes, without the dot.
	#[must_use]
	pub const fn extension(self) -> &'static str {
		match self {
			Self::Dwg(_) => "dwg",
			Self::Dxf(_) => "dxf",
		}
	}
}

impl Default for TargetFormat {
	fn default() -> Self {
		Self::Dwg(AcadVersion::V2007)
	}
}

impl fmt::Display for TargetFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.code())
	}
}

impl FromStr for TargetFormat {
	type Err = UnknownFormat;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let code = s.trim().to_ascii_uppercase();

		let parsed = if let Some(version) = code.strip_prefix("ACAD") {
			AcadVersion::from_code(version).map(Self::Dwg)
		} else if let Some(version) = code.strip_prefix("DXF") {
			AcadVersion::from_code(version).map(Self::Dxf)
		} else {
			None
		};

		parsed.ok_or_else(|| UnknownFormat(s.to_string()))
	}
}

impl TryFrom<String> for TargetFormat {
	type Error = UnknownFormat;

	fn try_from(code: String) -> Result<Self, Self::Error> {
		code.parse()
	}
}

impl From<TargetFormat> for String {
	fn from(format: TargetFormat) -> Self {
		format.code()
	}
}

/// Format of an input drawing, as the converter expects it on its command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
	Dwg,
	Dxf,
}

impl SourceFormat {
	/// Detects the format from the file extension, case insensitive.
	#[must_use]
	pub fn from_path(path: &Path) -> Option<Self> {
		let extension = path.extension()?.to_str()?.to_ascii_lowercase();

		match extension.as_str() {
			"dwg" => Some(Self::Dwg),
			"dxf" => Some(Self::Dxf),
			_ => None,
		}
	}

	#[must_use]
	pub const fn as_arg(self) -> &'static str {
		match self {
			Self::Dwg => "DWG",
			Self::Dxf => "DXF",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_round_trip_through_parsing() {
		for format in TargetFormat::all() {
			assert_eq!(format.code().parse::<TargetFormat>().ok(), Some(format));
		}

		assert_eq!(TargetFormat::all().count(), 22);
	}

	#[test]
	fn codes_labels_and_extensions() {
		let dwg = TargetFormat::Dwg(AcadVersion::V2007);
		assert_eq!(dwg.code(), "ACAD2007");
		assert_eq!(dwg.label(), "AutoCAD 2007 DWG");
		assert_eq!(dwg.extension(), "dwg");

		let dxf = TargetFormat::Dxf(AcadVersion::R14);
		assert_eq!(dxf.code(), "DXF14");
		assert_eq!(dxf.label(), "AutoCAD R14 DXF");
		assert_eq!(dxf.extension(), "dxf");
	}

	#[test]
	fn parsing_is_case_insensitive_and_rejects_unknown_codes() {
		assert_eq!(
			" acad2018 ".parse::<TargetFormat>().ok(),
			Some(TargetFormat::Dwg(AcadVersion::V2018))
		);
		assert!("ACAD2019".parse::<TargetFormat>().is_err());
		assert!("STEP".parse::<TargetFormat>().is_err());
	}

	#[test]
	fn source_format_from_extension() {
		assert_eq!(
			SourceFormat::from_path(Path::new("a/B.DWG")),
			Some(SourceFormat::Dwg)
		);
		assert_eq!(
			SourceFormat::from_path(Path::new("plan.dxf")),
			Some(SourceFormat::Dxf)
		);
		assert_eq!(SourceFormat::from_path(Path::new("part.step")), None);
		assert_eq!(SourceFormat::from_path(Path::new("README")), None);
	}
}
