//! Polyomino catalog
//!
//! Every shape a hand slot can be dealt, as 0/1 matrices read top-left first.

/// A named shape matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeDef {
    pub name: &'static str,
    pub matrix: &'static [&'static [u8]],
}

impl ShapeDef {
    const fn new(name: &'static str, matrix: &'static [&'static [u8]]) -> Self {
        Self { name, matrix }
    }
}

pub static SHAPES: [ShapeDef; 29] = [
    // Basics
    ShapeDef::new("dot", &[&[1]]),
    ShapeDef::new("mini-h", &[&[1, 1]]),
    ShapeDef::new("mini-v", &[&[1], &[1]]),
    // Squares
    ShapeDef::new("square-2x2", &[&[1, 1], &[1, 1]]),
    ShapeDef::new("square-3x3", &[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]]),
    // Bars
    ShapeDef::new("line-3h", &[&[1, 1, 1]]),
    ShapeDef::new("line-3v", &[&[1], &[1], &[1]]),
    ShapeDef::new("line-4h", &[&[1, 1, 1, 1]]),
    ShapeDef::new("line-4v", &[&[1], &[1], &[1], &[1]]),
    // Corners
    ShapeDef::new("corner-tl", &[&[1, 0], &[1, 1]]),
    ShapeDef::new("corner-tr", &[&[0, 1], &[1, 1]]),
    ShapeDef::new("corner-bl", &[&[1, 1], &[1, 0]]),
    ShapeDef::new("corner-br", &[&[1, 1], &[0, 1]]),
    // L
    ShapeDef::new("l-0", &[&[1, 0], &[1, 0], &[1, 1]]),
    ShapeDef::new("l-90", &[&[1, 1, 1], &[1, 0, 0]]),
    ShapeDef::new("l-180", &[&[1, 1], &[0, 1], &[0, 1]]),
    ShapeDef::new("l-270", &[&[0, 0, 1], &[1, 1, 1]]),
    // J
    ShapeDef::new("j-0", &[&[0, 1], &[0, 1], &[1, 1]]),
    ShapeDef::new("j-90", &[&[1, 0, 0], &[1, 1, 1]]),
    ShapeDef::new("j-180", &[&[1, 1], &[1, 0], &[1, 0]]),
    ShapeDef::new("j-270", &[&[1, 1, 1], &[0, 0, 1]]),
    // T
    ShapeDef::new("t-0", &[&[1, 1, 1], &[0, 1, 0]]),
    ShapeDef::new("t-90", &[&[0, 1], &[1, 1], &[0, 1]]),
    ShapeDef::new("t-180", &[&[0, 1, 0], &[1, 1, 1]]),
    ShapeDef::new("t-270", &[&[1, 0], &[1, 1], &[1, 0]]),
    // S / Z
    ShapeDef::new("s-h", &[&[0, 1, 1], &[1, 1, 0]]),
    ShapeDef::new("s-v", &[&[1, 0], &[1, 1], &[0, 1]]),
    ShapeDef::new("z-h", &[&[1, 1, 0], &[0, 1, 1]]),
    ShapeDef::new("z-v", &[&[0, 1], &[1, 1], &[1, 0]]),
];

/// Look a shape up by name
pub fn find(name: &str) -> Option<&'static ShapeDef> {
    SHAPES.iter().find(|shape| shape.name == name)
}
