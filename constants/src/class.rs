/// Semantic label codes assigned to merged voxel regions
pub const FLOOR_LABEL: u8 = 1;
pub const WALL_LABEL: u8 = 2;
pub const OBJECT_LABEL: u8 = 3;

pub struct ClassInfo {
    pub id: u8,
    pub name: &'static str,
}

pub const CLASS_MAP: &[ClassInfo] = &[
    ClassInfo {
        id: FLOOR_LABEL,
        name: "floor",
    },
    ClassInfo {
        id: WALL_LABEL,
        name: "wall",
    },
    ClassInfo {
        id: OBJECT_LABEL,
        name: "object",
    },
];

pub fn get_class_name(id: u8) -> &'static str {
    CLASS_MAP
        .iter()
        .find(|c| c.id == id)
        .map_or("unknown", |c| c.name)
}
