/// Point source reader for PLY-style (ASCII or binary) and LAS/LAZ clouds
use crate::error::{AnalysisError, Result};
use crate::point::Point;
use constants::coordinate_system::transform_coordinates;
use las::Reader;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

const HEADER_SENTINEL: &str = "end_header";
const LAS_MAGIC: &[u8; 4] = b"LASF";
/// Upper bound on up-front allocation driven by a declared record count.
const PREALLOC_CAP: usize = 1 << 24;

/// Body encoding declared by the `format` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

/// Scalar property types allowed in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => Self::I8,
            "uchar" | "uint8" => Self::U8,
            "short" | "int16" => Self::I16,
            "ushort" | "uint16" => Self::U16,
            "int" | "int32" => Self::I32,
            "uint" | "uint32" => Self::U32,
            "float" | "float32" => Self::F32,
            "double" | "float64" => Self::F64,
            _ => return None,
        })
    }

    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: ScalarType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub count: usize,
    pub properties: Vec<Property>,
    /// Records contain a variable-length list, so they have no fixed size.
    pub has_list: bool,
}

impl Element {
    fn stride(&self) -> usize {
        self.properties.iter().map(|p| p.ty.size()).sum()
    }
}

/// Parsed header plus the byte offset where the body starts.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyHeader {
    pub encoding: Encoding,
    pub elements: Vec<Element>,
    pub body_offset: usize,
}

impl PlyHeader {
    fn vertex_index(&self) -> Option<usize> {
        self.elements.iter().position(|e| e.name == "vertex")
    }

    /// Declared vertex count, if the header has a vertex element.
    pub fn vertex_count(&self) -> Option<usize> {
        self.vertex_index().map(|i| self.elements[i].count)
    }
}

/// Positions of x, y, z within one vertex record.
#[derive(Debug, Clone, Copy)]
struct RecordLayout {
    stride: usize,
    columns: [usize; 3],
    offsets: [usize; 3],
    types: [ScalarType; 3],
}

impl RecordLayout {
    /// Twelve-byte `float x, float y, float z` record.
    const XYZ_F32: Self = Self {
        stride: 12,
        columns: [0, 1, 2],
        offsets: [0, 4, 8],
        types: [ScalarType::F32; 3],
    };

    fn from_properties(properties: &[Property]) -> Result<Self> {
        if properties.is_empty() {
            return Ok(Self::XYZ_F32);
        }

        let mut layout = Self {
            stride: 0,
            columns: [usize::MAX; 3],
            offsets: [0; 3],
            types: [ScalarType::F32; 3],
        };
        for (column, property) in properties.iter().enumerate() {
            let axis = match property.name.as_str() {
                "x" => Some(0),
                "y" => Some(1),
                "z" => Some(2),
                _ => None,
            };
            if let Some(axis) = axis {
                layout.columns[axis] = column;
                layout.offsets[axis] = layout.stride;
                layout.types[axis] = property.ty;
            }
            layout.stride += property.ty.size();
        }

        if layout.columns.contains(&usize::MAX) {
            return Err(AnalysisError::InvalidHeader(
                "vertex element must declare x, y and z properties".into(),
            ));
        }
        Ok(layout)
    }
}

/// Parse the textual header at the start of `bytes`.
pub fn parse_header(bytes: &[u8]) -> Result<PlyHeader> {
    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();
    let mut offset = 0;
    let mut first_line = true;

    while offset < bytes.len() {
        let end = bytes[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |i| offset + i);
        let raw = &bytes[offset..end];
        offset = (end + 1).min(bytes.len());

        let line = std::str::from_utf8(raw)
            .map_err(|_| AnalysisError::InvalidHeader("header is not valid text".into()))?
            .trim();

        if first_line {
            if line != "ply" {
                return Err(AnalysisError::InvalidHeader(format!(
                    "expected 'ply' magic line, found '{}'",
                    line
                )));
            }
            first_line = false;
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["comment", ..] | ["obj_info", ..] => {}
            ["format", kind, ..] => {
                encoding = Some(match *kind {
                    "ascii" => Encoding::Ascii,
                    "binary_little_endian" => Encoding::BinaryLittleEndian,
                    "binary_big_endian" => Encoding::BinaryBigEndian,
                    other => {
                        return Err(AnalysisError::InvalidHeader(format!(
                            "unknown format '{}'",
                            other
                        )));
                    }
                });
            }
            ["element", name, count] => {
                let count = count.parse().map_err(|_| {
                    AnalysisError::InvalidHeader(format!("bad element count in '{}'", line))
                })?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                    has_list: false,
                });
            }
            ["property", "list", ..] => {
                let element = elements.last_mut().ok_or_else(|| {
                    AnalysisError::InvalidHeader("property before any element".into())
                })?;
                if element.name == "vertex" {
                    return Err(AnalysisError::InvalidHeader(
                        "list properties are not supported in vertex records".into(),
                    ));
                }
                element.has_list = true;
            }
            ["property", ty, name] => {
                let ty = ScalarType::parse(ty).ok_or_else(|| {
                    AnalysisError::InvalidHeader(format!("unsupported property type '{}'", ty))
                })?;
                let element = elements.last_mut().ok_or_else(|| {
                    AnalysisError::InvalidHeader("property before any element".into())
                })?;
                element.properties.push(Property {
                    name: name.to_string(),
                    ty,
                });
            }
            [sentinel] if *sentinel == HEADER_SENTINEL => {
                let encoding = encoding.ok_or_else(|| {
                    AnalysisError::InvalidHeader("missing format line".into())
                })?;
                return Ok(PlyHeader {
                    encoding,
                    elements,
                    body_offset: offset,
                });
            }
            _ => debug!("Ignoring header line: {}", line),
        }
    }

    Err(AnalysisError::InvalidHeader(format!(
        "missing '{}' line",
        HEADER_SENTINEL
    )))
}

/// Read every valid point from an in-memory point cloud file.
///
/// PLY input is a textual header terminated by `end_header` followed by
/// vertex records. Truncated bodies are read as far as complete records
/// allow and non-finite coordinates are dropped.
pub fn read_points(bytes: &[u8]) -> Result<Vec<Point>> {
    let points = if bytes.starts_with(LAS_MAGIC) {
        read_las(bytes)?
    } else {
        read_ply(bytes)?
    };

    if points.is_empty() {
        return Err(AnalysisError::EmptyPointCloud);
    }
    Ok(points)
}

/// Read a point cloud file from disk.
pub fn read_points_from_path(path: &Path) -> Result<Vec<Point>> {
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    info!("Read {} bytes from {}", bytes.len(), path.display());
    read_points(&bytes)
}

fn read_ply(bytes: &[u8]) -> Result<Vec<Point>> {
    let header = parse_header(bytes)?;
    let vertex_index = header.vertex_index();
    if vertex_index.is_none() && !header.elements.is_empty() {
        return Err(AnalysisError::InvalidHeader(
            "header declares elements but no vertex element".into(),
        ));
    }
    let properties = vertex_index.map_or(&[][..], |i| &header.elements[i].properties[..]);
    let layout = RecordLayout::from_properties(properties)?;
    let preceding = &header.elements[..vertex_index.unwrap_or(0)];
    let body = &bytes[header.body_offset..];

    info!(
        "PLY header: {:?}, declared vertices: {}",
        header.encoding,
        header
            .vertex_count()
            .map_or_else(|| "unspecified".to_string(), |n| n.to_string())
    );

    let points = match header.encoding {
        Encoding::Ascii => read_ascii_body(body, preceding, header.vertex_count(), &layout),
        Encoding::BinaryLittleEndian | Encoding::BinaryBigEndian => read_binary_body(
            body,
            preceding,
            header.vertex_count(),
            &layout,
            header.encoding == Encoding::BinaryBigEndian,
        )?,
    };

    info!("Parsed {} valid points", points.len());
    Ok(points)
}

fn read_ascii_body(
    body: &[u8],
    preceding: &[Element],
    declared: Option<usize>,
    layout: &RecordLayout,
) -> Vec<Point> {
    let text = String::from_utf8_lossy(body);
    let skip = preceding
        .iter()
        .fold(0usize, |acc, e| acc.saturating_add(e.count));

    let rows = text.lines().filter(|l| !l.trim().is_empty()).skip(skip);
    let limit = declared.unwrap_or(usize::MAX);
    let mut points = Vec::with_capacity(declared.unwrap_or(0).min(PREALLOC_CAP));
    let mut consumed = 0;
    let mut rejected = 0usize;

    for row in rows.take(limit) {
        consumed += 1;
        let columns: Vec<&str> = row.split_whitespace().collect();
        let coord = |axis: usize| {
            columns
                .get(layout.columns[axis])
                .and_then(|c| c.parse::<f64>().ok())
        };
        match (coord(0), coord(1), coord(2)) {
            (Some(x), Some(y), Some(z)) => match Point::finite(x, y, z) {
                Some(p) => points.push(p),
                None => rejected += 1,
            },
            _ => rejected += 1,
        }
    }

    if let Some(n) = declared.filter(|&n| n > consumed) {
        warn!("Header declares {} points but only {} rows present", n, consumed);
    }
    if rejected > 0 {
        warn!("Dropped {} malformed or non-finite rows", rejected);
    }
    points
}

fn read_binary_body(
    body: &[u8],
    preceding: &[Element],
    declared: Option<usize>,
    layout: &RecordLayout,
    big_endian: bool,
) -> Result<Vec<Point>> {
    let mut skip_bytes = 0usize;
    for element in preceding {
        if element.has_list {
            return Err(AnalysisError::InvalidHeader(
                "cannot skip list elements before vertex data".into(),
            ));
        }
        skip_bytes = skip_bytes.saturating_add(element.count.saturating_mul(element.stride()));
    }
    let body = body.get(skip_bytes..).unwrap_or(&[]);

    let available = body.len() / layout.stride;
    let count = declared.map_or(available, |n| n.min(available));
    if let Some(n) = declared.filter(|&n| n > available) {
        warn!(
            "Header declares {} points but buffer holds {} complete records",
            n, available
        );
    }

    let mut points = Vec::with_capacity(count);
    let mut rejected = 0usize;
    for record in body.chunks_exact(layout.stride).take(count) {
        let read = |axis: usize| {
            let start = layout.offsets[axis];
            read_scalar(&record[start..], layout.types[axis], big_endian)
        };
        match Point::finite(read(0), read(1), read(2)) {
            Some(p) => points.push(p),
            None => rejected += 1,
        }
    }

    if rejected > 0 {
        warn!("Dropped {} non-finite points", rejected);
    }
    Ok(points)
}

fn bytes_of<const N: usize>(b: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&b[..N]);
    out
}

fn read_scalar(b: &[u8], ty: ScalarType, big_endian: bool) -> f64 {
    macro_rules! decode {
        ($t:ty, $n:literal) => {{
            let raw = bytes_of::<$n>(b);
            if big_endian {
                <$t>::from_be_bytes(raw) as f64
            } else {
                <$t>::from_le_bytes(raw) as f64
            }
        }};
    }
    match ty {
        ScalarType::I8 => decode!(i8, 1),
        ScalarType::U8 => decode!(u8, 1),
        ScalarType::I16 => decode!(i16, 2),
        ScalarType::U16 => decode!(u16, 2),
        ScalarType::I32 => decode!(i32, 4),
        ScalarType::U32 => decode!(u32, 4),
        ScalarType::F32 => decode!(f32, 4),
        ScalarType::F64 => decode!(f64, 8),
    }
}

/// Read LAS/LAZ data, converting from the Z-up scan frame to Y-up.
fn read_las(bytes: &[u8]) -> Result<Vec<Point>> {
    let mut reader = Reader::new(Cursor::new(bytes.to_vec()))?;
    let header = reader.header();
    info!(
        "LAS/LAZ file: version {}.{}, {} points, format {:?}",
        header.version().major,
        header.version().minor,
        header.number_of_points(),
        header.point_format().to_u8()
    );

    let declared = header.number_of_points();
    let capacity = usize::try_from(declared).map_or(PREALLOC_CAP, |n| n.min(PREALLOC_CAP));
    let mut points = Vec::with_capacity(capacity);
    let mut rejected = 0usize;
    for (index, point_result) in reader.points().enumerate() {
        let point = match point_result {
            Ok(point) => point,
            Err(err) => {
                warn!(
                    "LAS body ends after {} of {} declared records: {}",
                    index, declared, err
                );
                break;
            }
        };
        let (x, y, z) = transform_coordinates(point.x, point.y, point.z);
        match Point::finite(x, y, z) {
            Some(p) => points.push(p),
            None => rejected += 1,
        }
    }

    if rejected > 0 {
        warn!("Dropped {} non-finite points", rejected);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_cloud(points: &[[f32; 3]], declared: usize, big_endian: bool) -> Vec<u8> {
        let format = if big_endian {
            "binary_big_endian"
        } else {
            "binary_little_endian"
        };
        let mut bytes = format!(
            "ply\nformat {} 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\nend_header\n",
            format, declared
        )
        .into_bytes();
        for p in points {
            for v in p {
                if big_endian {
                    bytes.extend_from_slice(&v.to_be_bytes());
                } else {
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
        bytes
    }

    #[test]
    fn reads_ascii_rows_ignoring_extra_columns() {
        let data = b"ply\nformat ascii 1.0\ncomment scan\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nend_header\n1 2 3 255\n4.5 5 6 0\n";
        let points = read_points(data).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 2.0, 3.0), Point::new(4.5, 5.0, 6.0)]);
    }

    #[test]
    fn ascii_drops_non_finite_and_malformed_rows() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 4\nend_header\n1 2 3\nnan 0 0\n1 2\n0 inf 0\n";
        let points = read_points(data).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn ascii_reads_only_declared_rows() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 1\nend_header\n1 1 1\n2 2 2\n";
        assert_eq!(read_points(data).unwrap().len(), 1);
    }

    #[test]
    fn reads_little_and_big_endian_binary() {
        let pts = [[0.5f32, -1.0, 2.0], [3.0, 4.0, 5.0]];
        for big_endian in [false, true] {
            let points = read_points(&binary_cloud(&pts, 2, big_endian)).unwrap();
            assert_eq!(
                points,
                vec![Point::new(0.5, -1.0, 2.0), Point::new(3.0, 4.0, 5.0)]
            );
        }
    }

    #[test]
    fn binary_short_body_reads_complete_records_only() {
        let mut bytes = binary_cloud(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], 10, false);
        bytes.extend_from_slice(&[0u8; 7]);
        let points = read_points(&bytes).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn binary_drops_nan_records() {
        let bytes = binary_cloud(&[[f32::NAN, 0.0, 0.0], [1.0, 1.0, 1.0]], 2, false);
        assert_eq!(read_points(&bytes).unwrap(), vec![Point::new(1.0, 1.0, 1.0)]);
    }

    #[test]
    fn binary_respects_declared_property_layout() {
        let mut bytes = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty double x\nproperty uchar intensity\nproperty double y\nproperty double z\nend_header\n".to_vec();
        bytes.extend_from_slice(&1.5f64.to_le_bytes());
        bytes.push(7);
        bytes.extend_from_slice(&2.5f64.to_le_bytes());
        bytes.extend_from_slice(&3.5f64.to_le_bytes());
        assert_eq!(read_points(&bytes).unwrap(), vec![Point::new(1.5, 2.5, 3.5)]);
    }

    #[test]
    fn binary_without_properties_defaults_to_xyz_floats() {
        let mut bytes = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nend_header\n".to_vec();
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(read_points(&bytes).unwrap(), vec![Point::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn header_without_sentinel_is_rejected() {
        let err = read_points(b"ply\nformat ascii 1.0\nelement vertex 1\n1 2 3\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidHeader(_)));
    }

    #[test]
    fn vertex_list_property_is_rejected() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty list uchar int idx\nend_header\n";
        assert!(matches!(
            parse_header(data),
            Err(AnalysisError::InvalidHeader(_))
        ));
    }

    #[test]
    fn zero_valid_points_is_fatal() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 0\nend_header\n";
        assert!(matches!(
            read_points(data),
            Err(AnalysisError::EmptyPointCloud)
        ));
    }

    #[test]
    fn header_records_body_offset() {
        let data = b"ply\r\nformat ascii 1.0\r\nend_header\r\n0 0 0\r\n";
        let header = parse_header(data).unwrap();
        assert_eq!(header.encoding, Encoding::Ascii);
        assert_eq!(&data[header.body_offset..], b"0 0 0\r\n");
        assert_eq!(header.vertex_count(), None);
    }

    #[test]
    fn header_without_vertex_element_is_rejected() {
        let data = b"ply\nformat ascii 1.0\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n3 0 1 2\n";
        assert!(matches!(
            read_points(data),
            Err(AnalysisError::InvalidHeader(_))
        ));
    }

    #[test]
    fn ascii_skips_rows_of_preceding_elements() {
        let data = b"ply\nformat ascii 1.0\nelement camera 1\nproperty float fov\nelement vertex 1\nend_header\n60\n1 2 3\n";
        assert_eq!(read_points(data).unwrap(), vec![Point::new(1.0, 2.0, 3.0)]);
    }

    fn las_cloud(count: usize) -> Vec<u8> {
        let mut writer =
            las::Writer::new(Cursor::new(Vec::new()), las::Header::default()).unwrap();
        for i in 0..count {
            writer
                .write_point(las::Point {
                    x: i as f64,
                    y: 2.0,
                    z: 0.5,
                    ..Default::default()
                })
                .unwrap();
        }
        writer.into_inner().unwrap().into_inner()
    }

    #[test]
    fn las_points_are_converted_to_y_up() {
        let points = read_points(&las_cloud(10)).unwrap();
        assert_eq!(points.len(), 10);
        let last = points[9];
        assert!((last.x - 9.0).abs() < 1e-6);
        assert!((last.y - 0.5).abs() < 1e-6);
        assert!((last.z + 2.0).abs() < 1e-6);
    }

    #[test]
    fn truncated_las_keeps_complete_records() {
        let mut bytes = las_cloud(10);
        bytes.truncate(bytes.len() - 10);
        let points = read_points(&bytes).unwrap();
        assert_eq!(points.len(), 9);
        assert!((points[8].x - 8.0).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let err = read_points_from_path(Path::new("/no/such/cloud.ply")).unwrap_err();
        assert!(matches!(err, AnalysisError::InputNotFound(_)));
    }
}
