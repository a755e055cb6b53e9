mod parse_gcode;
mod parse_numbers;

pub use parse_gcode::Code;
pub use parse_gcode::Line;
pub use parse_gcode::ParseError;
pub use parse_gcode::Word;
pub use parse_gcode::MAX_ARGS;
