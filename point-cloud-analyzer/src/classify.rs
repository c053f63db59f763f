/// Heuristic floor/wall/object labelling of merged regions
use crate::bounds::PointCloudBounds;
use crate::merge::MergedRegion;
use constants::analysis::{
    FLOOR_MAX_HEIGHT, FLOOR_MIN_EXTENT, PILLAR_MAX_EXTENT, PILLAR_MIN_HEIGHT,
    WALL_MIN_ASPECT, WALL_MIN_HEIGHT_RATIO,
};
use constants::class::{FLOOR_LABEL, OBJECT_LABEL, WALL_LABEL, get_class_name};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionLabel {
    Floor,
    Wall,
    Object,
}

impl RegionLabel {
    pub fn code(self) -> u8 {
        match self {
            Self::Floor => FLOOR_LABEL,
            Self::Wall => WALL_LABEL,
            Self::Object => OBJECT_LABEL,
        }
    }

    pub fn name(self) -> &'static str {
        get_class_name(self.code())
    }
}

impl Serialize for RegionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Label a box from its dimensions. Rules are checked floor, then wall.
pub fn classify_dimensions(width: f64, height: f64, depth: f64) -> RegionLabel {
    let horizontal_max = width.max(depth);
    let horizontal_min = width.min(depth);

    if height < FLOOR_MAX_HEIGHT && horizontal_max > FLOOR_MIN_EXTENT {
        return RegionLabel::Floor;
    }

    let elongated_wall = horizontal_max / horizontal_min > WALL_MIN_ASPECT
        && height / horizontal_max > WALL_MIN_HEIGHT_RATIO;
    let pillar = height > PILLAR_MIN_HEIGHT && horizontal_max < PILLAR_MAX_EXTENT;
    if elongated_wall || pillar {
        return RegionLabel::Wall;
    }

    RegionLabel::Object
}

pub fn classify_bounds(bounds: &PointCloudBounds) -> RegionLabel {
    let (width, height, depth) = bounds.dimensions();
    classify_dimensions(width, height, depth)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRegion {
    pub bounds: PointCloudBounds,
    pub point_count: usize,
    pub voxel_count: usize,
    pub label: RegionLabel,
}

impl ClassifiedRegion {
    pub fn from_region(region: &MergedRegion) -> Self {
        Self {
            bounds: region.bounds,
            point_count: region.point_count,
            voxel_count: region.cell_count,
            label: classify_bounds(&region.bounds),
        }
    }
}

pub fn classify_regions(regions: &[MergedRegion]) -> Vec<ClassifiedRegion> {
    regions.iter().map(ClassifiedRegion::from_region).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_boxes() {
        assert_eq!(classify_dimensions(2.0, 0.2, 2.0), RegionLabel::Floor);
        assert_eq!(classify_dimensions(0.4, 2.0, 0.4), RegionLabel::Wall);
        assert_eq!(classify_dimensions(1.0, 1.0, 1.0), RegionLabel::Object);
    }

    #[test]
    fn floor_rule_wins_over_wall_rule() {
        // Thin and elongated, but flat enough to be a floor first.
        assert_eq!(classify_dimensions(4.0, 0.1, 0.2), RegionLabel::Floor);
    }

    #[test]
    fn elongated_tall_sliver_is_wall() {
        // aspect 4.0 > 3, height ratio 2.5 > 2
        assert_eq!(classify_dimensions(1.0, 2.5, 0.25), RegionLabel::Wall);
        // height ratio only 1.5
        assert_eq!(classify_dimensions(2.0, 3.0, 0.5), RegionLabel::Object);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(classify_dimensions(2.0, 0.3, 2.0), RegionLabel::Object);
        assert_eq!(classify_dimensions(1.0, 0.2, 1.0), RegionLabel::Object);
        assert_eq!(classify_dimensions(0.8, 1.6, 0.5), RegionLabel::Object);
    }

    #[test]
    fn label_serialises_by_name() {
        assert_eq!(serde_json::to_string(&RegionLabel::Floor).unwrap(), "\"floor\"");
        assert_eq!(RegionLabel::Wall.name(), "wall");
        assert_eq!(RegionLabel::Object.name(), "object");
    }
}
