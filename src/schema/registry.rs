// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Static record schema per file type
//!
//! Each action block is described by the CSV preamble it emits and by an
//! ordered list of slots. A slot holds one or more alternative line kinds
//! (e.g. `join`, `cut` or `intersect`) and says how often it may occur. A line
//! kind is identified by its leading key words and may own data rows.

use super::fields::{choice, integer, number, text, Fields};
use crate::timeline::{FileType, Line};

pub const AXES: &[&str] = &["x", "y", "z"];
pub const UNITS: &[&str] = &["mm", "cm", "m"];
pub const ON_OFF: &[&str] = &["on", "off"];
pub const OBJECT_TYPES: &[&str] = &["component", "body"];
pub const MIRROR_OPERATIONS: &[&str] = &["new_component", "new_body", "join"];
pub const SEGMENT_TYPES: &[&str] = &[
    "spline",
    "line",
    "arc",
    "circle",
    "ellipse",
    "point",
    "offset_curve",
    "textbox",
];

/// How often a slot may occur in a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    Once,
    Optional,
    AtLeastOnce,
    Any,
}

impl Occurs {
    pub fn allows(self, count: usize) -> bool {
        match self {
            Occurs::Once => count == 1,
            Occurs::Optional => count <= 1,
            Occurs::AtLeastOnce => count >= 1,
            Occurs::Any => true,
        }
    }

    pub fn repeatable(self) -> bool {
        matches!(self, Occurs::AtLeastOnce | Occurs::Any)
    }
}

/// Data rows owned by a line kind
#[derive(Debug, Clone, Copy)]
pub struct RowSpec {
    pub fields: Fields,
    pub min: usize,
    pub max: Option<usize>,
}

impl RowSpec {
    pub const fn new(fields: Fields, min: usize, max: Option<usize>) -> Self {
        Self { fields, min, max }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    pub fn expected(&self) -> String {
        match self.max {
            Some(max) if max == self.min => super::fields::plural(max, "row"),
            Some(max) => format!("{} to {} rows", self.min, max),
            None => format!("at least {}", super::fields::plural(self.min, "row")),
        }
    }
}

/// One kind of line within a block
#[derive(Debug, Clone, Copy)]
pub struct LineSpec {
    /// Leading words identifying the line, e.g. `extent_type, distance`
    pub key: &'static [&'static str],
    /// Fields after the key
    pub fields: Fields,
    pub rows: Option<RowSpec>,
    /// Key words are written to the CSV
    pub emit_key: bool,
    /// Trailing `co_rail`/`cross_rails` annotations are accepted
    pub rail_annotations: bool,
}

impl LineSpec {
    pub const fn new(key: &'static [&'static str], fields: Fields) -> Self {
        Self {
            key,
            fields,
            rows: None,
            emit_key: true,
            rail_annotations: false,
        }
    }

    pub const fn with_rows(mut self, fields: Fields, min: usize, max: Option<usize>) -> Self {
        self.rows = Some(RowSpec::new(fields, min, max));
        self
    }

    pub const fn hidden_key(mut self) -> Self {
        self.emit_key = false;
        self
    }

    pub const fn with_rails(mut self) -> Self {
        self.rail_annotations = true;
        self
    }

    /// Key words must be unquoted, so a quoted row can carry a key's text
    pub fn matches(&self, line: &Line) -> bool {
        self.key.iter().enumerate().all(|(i, word)| {
            line.fields
                .get(i)
                .map_or(false, |field| !field.quoted && field.text == *word)
        })
    }

    pub fn name(&self) -> String {
        self.key.join(", ")
    }
}

/// Alternative line kinds sharing one position in a block
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub name: &'static str,
    pub occurs: Occurs,
    pub kinds: &'static [LineSpec],
}

/// First lines of an emitted CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preamble {
    /// `<keyword>`
    Keyword,
    /// `<keyword>, <name>`
    KeywordName,
    /// `<keyword>, <name>[, <group component>]`
    KeywordNameGroup,
    /// `<keyword>` then `<name>`
    KeywordThenName,
    /// `<keyword>` then `<group component or name>`
    KeywordThenGroup,
}

#[derive(Debug)]
pub struct Schema {
    pub file_type: FileType,
    pub preamble: Preamble,
    /// A unit line follows the preamble
    pub unit_line: bool,
    /// Anonymous rows directly after the header
    pub leading_rows: Option<RowSpec>,
    pub slots: &'static [Slot],
    /// Slots must appear in declaration order
    pub ordered: bool,
}

impl Schema {
    /// Find the slot and line kind matching a body line
    pub fn line_kind(&self, line: &Line) -> Option<(usize, &'static LineSpec)> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.kinds
                .iter()
                .find(|kind| kind.matches(line))
                .map(|kind| (index, kind))
        })
    }

    /// Keys accepted in the body, for error messages
    pub fn expected_keys(&self) -> String {
        self.slots
            .iter()
            .flat_map(|slot| slot.kinds.iter().map(|kind| kind.name()))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

const XY: Fields = Fields::fixed(&[number("x"), number("y")]);
const XYZ: Fields = Fields::fixed(&[number("x"), number("y"), number("z")]);
const SPLINE_POINT: Fields = Fields::optional(
    &[number("x"), number("y")],
    &[number("tangent_angle"), number("tangent_length")],
);
const CIRCLE: Fields = Fields::fixed(&[number("center_x"), number("center_y"), number("radius")]);
const OFFSET: Fields = Fields::fixed(&[number("direction_x"), number("direction_y"), number("distance")]);
const TEXTBOX: Fields = Fields::fixed(&[number("x"), number("y"), number("height"), text("text")]);
const NAME_ROW: Fields = Fields::fixed(&[text("name")]);
const SKETCH_REF: Fields = Fields::optional(&[text("sketch")], &[integer("index")]);
const PROFILE_REF: Fields = Fields::repeated(&[text("sketch")], integer("index"), 0);
const BODIES: Fields = Fields::repeated(&[], text("body"), 1);
const RESULTS: Fields = Fields::repeated(&[], text("result"), 1);
const ECHO: Fields = Fields::repeated(&[], text("text"), 0);

const SEGMENTS: &[LineSpec] = &[
    LineSpec::new(&["spline"], Fields::NONE).with_rows(SPLINE_POINT, 2, None).with_rails(),
    LineSpec::new(&["line"], Fields::NONE).with_rows(XY, 2, None).with_rails(),
    LineSpec::new(&["arc"], Fields::NONE).with_rows(XY, 3, Some(3)).with_rails(),
    LineSpec::new(&["circle"], Fields::NONE).with_rows(CIRCLE, 1, None).with_rails(),
    LineSpec::new(&["ellipse"], Fields::NONE).with_rows(XY, 3, Some(3)).with_rails(),
    LineSpec::new(&["point"], Fields::NONE).with_rows(XY, 1, None).with_rails(),
    LineSpec::new(&["offset_curve"], Fields::NONE).with_rows(OFFSET, 1, Some(1)).with_rails(),
    LineSpec::new(&["textbox"], Fields::NONE).with_rows(TEXTBOX, 1, Some(1)).with_rails(),
];

const OPERATIONS: &[LineSpec] = &[
    LineSpec::new(&["operation", "join"], BODIES),
    LineSpec::new(&["operation", "cut"], BODIES),
    LineSpec::new(&["operation", "intersect"], BODIES),
    LineSpec::new(&["operation", "new_body"], Fields::NONE),
];

const ASSEMBLY_ACTION_FIELDS: Fields = Fields::optional(&[text("location")], &[text("component")]);

const fn assembly_action(key: &'static [&'static str]) -> LineSpec {
    LineSpec::new(key, ASSEMBLY_ACTION_FIELDS)
}

const ASSEMBLY_ACTIONS: &[LineSpec] = &[
    assembly_action(&["create_sketch"]),
    assembly_action(&["multiple_create_sketch"]),
    assembly_action(&["create_plane"]),
    assembly_action(&["multiple_create_plane"]),
    assembly_action(&["create_loft"]),
    assembly_action(&["multiple_create_loft"]),
    assembly_action(&["run_extrude"]),
    assembly_action(&["multiple_run_extrude"]),
    assembly_action(&["run_revolve"]),
    assembly_action(&["multiple_run_revolve"]),
    assembly_action(&["run_split"]),
    assembly_action(&["multiple_run_split"]),
    assembly_action(&["run_combine"]),
    assembly_action(&["multiple_run_combine"]),
    assembly_action(&["run_mirror"]),
    assembly_action(&["multiple_run_mirror"]),
    assembly_action(&["run_movecopy"]),
    assembly_action(&["multiple_run_movecopy"]),
    assembly_action(&["run_modifyedges"]),
    assembly_action(&["multiple_run_modifyedges"]),
    LineSpec::new(&["echo"], ECHO),
];

const ASSEMBLY_FILENAMES: &[LineSpec] =
    &[LineSpec::new(&["assembly_filenames"], Fields::NONE).with_rows(Fields::fixed(&[text("filename")]), 1, None)];

const ECHO_LINES: &[LineSpec] = &[LineSpec::new(&["echo"], ECHO)];

static SCHEMAS: &[Schema] = &[
    Schema {
        file_type: FileType::Sketch,
        preamble: Preamble::Keyword,
        unit_line: true,
        leading_rows: None,
        slots: &[
            Slot {
                name: "offset_plane",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(
                    &["offset_plane"],
                    Fields::fixed(&[choice("axis", AXES), number("offset")]),
                )
                .hidden_key()],
            },
            Slot {
                name: "segment",
                occurs: Occurs::AtLeastOnce,
                kinds: SEGMENTS,
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::Plane,
        preamble: Preamble::Keyword,
        unit_line: true,
        leading_rows: Some(RowSpec::new(XYZ, 3, Some(3))),
        slots: &[],
        ordered: true,
    },
    Schema {
        file_type: FileType::Loft,
        preamble: Preamble::KeywordNameGroup,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "profiles",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["profiles"], Fields::NONE).with_rows(SKETCH_REF, 2, None)],
            },
            Slot {
                name: "rails",
                occurs: Occurs::Optional,
                kinds: &[LineSpec::new(&["rails"], Fields::NONE).with_rows(SKETCH_REF, 1, None)],
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::Extrude,
        preamble: Preamble::KeywordNameGroup,
        unit_line: true,
        leading_rows: None,
        slots: &[
            Slot {
                name: "profile",
                occurs: Occurs::Once,
                kinds: &[
                    LineSpec::new(&["profile"], PROFILE_REF),
                    LineSpec::new(&["text"], PROFILE_REF),
                    LineSpec::new(&["face"], Fields::repeated(&[text("body")], integer("index"), 0)),
                ],
            },
            Slot {
                name: "offset",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["offset"], Fields::fixed(&[number("offset")]))],
            },
            Slot {
                name: "taper_angle",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(
                    &["taper_angle"],
                    Fields::optional(&[number("angle")], &[number("angle2")]),
                )],
            },
            Slot {
                name: "extent_type",
                occurs: Occurs::Once,
                kinds: &[
                    LineSpec::new(
                        &["extent_type", "distance"],
                        Fields::optional(&[number("distance")], &[number("distance2")]),
                    ),
                    LineSpec::new(&["extent_type", "to_object"], Fields::fixed(&[text("object")])),
                ],
            },
            Slot {
                name: "operation",
                occurs: Occurs::Once,
                kinds: OPERATIONS,
            },
            Slot {
                name: "extrude_results",
                occurs: Occurs::Optional,
                kinds: &[LineSpec::new(&["extrude_results"], RESULTS)],
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::Revolve,
        preamble: Preamble::KeywordNameGroup,
        unit_line: true,
        leading_rows: None,
        slots: &[
            Slot {
                name: "profile",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["profile"], PROFILE_REF)],
            },
            Slot {
                name: "rotation",
                occurs: Occurs::Once,
                kinds: &[
                    LineSpec::new(&["rotation_axis"], Fields::fixed(&[choice("axis", AXES)])),
                    LineSpec::new(&["rotation_line"], SKETCH_REF),
                ],
            },
            Slot {
                name: "rotation_angles",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(
                    &["rotation_angles"],
                    Fields::optional(&[number("angle")], &[number("angle2")]),
                )],
            },
            Slot {
                name: "operation",
                occurs: Occurs::Once,
                kinds: OPERATIONS,
            },
            Slot {
                name: "revolve_results",
                occurs: Occurs::Optional,
                kinds: &[LineSpec::new(&["revolve_results"], RESULTS)],
            },
            Slot {
                name: "light_bulb",
                occurs: Occurs::Optional,
                kinds: &[LineSpec::new(&["light_bulb"], Fields::fixed(&[choice("state", ON_OFF)]))],
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::Split,
        preamble: Preamble::Keyword,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "split_body",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["split_body"], Fields::fixed(&[text("body")]))],
            },
            Slot {
                name: "split_tool",
                occurs: Occurs::Once,
                kinds: &[
                    LineSpec::new(&["split_tool", "plane"], Fields::fixed(&[text("plane")])),
                    LineSpec::new(&["split_tool", "body"], Fields::fixed(&[text("body")])),
                ],
            },
            Slot {
                name: "splitted_bodies",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["splitted_bodies"], Fields::NONE).with_rows(NAME_ROW, 1, None)],
            },
            Slot {
                name: "remove_bodies",
                occurs: Occurs::Optional,
                kinds: &[LineSpec::new(&["remove_bodies"], Fields::NONE).with_rows(NAME_ROW, 0, None)],
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::Combine,
        preamble: Preamble::KeywordThenName,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "operation",
                occurs: Occurs::Once,
                kinds: &[
                    LineSpec::new(&["join"], Fields::NONE),
                    LineSpec::new(&["cut"], Fields::NONE),
                    LineSpec::new(&["intersect"], Fields::NONE),
                ],
            },
            Slot {
                name: "target_body",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["target_body"], Fields::fixed(&[text("body")]))],
            },
            Slot {
                name: "tool_bodies",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["tool_bodies"], Fields::NONE).with_rows(NAME_ROW, 1, None)],
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::Mirror,
        preamble: Preamble::KeywordNameGroup,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "operation",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(
                    &["operation"],
                    Fields::fixed(&[choice("operation", MIRROR_OPERATIONS)]),
                )],
            },
            Slot {
                name: "mirror_plane",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["mirror_plane"], Fields::fixed(&[text("plane")]))],
            },
            Slot {
                name: "mirror_objects",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["mirror_objects"], Fields::NONE).with_rows(NAME_ROW, 1, None)],
            },
            Slot {
                name: "mirror_results",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["mirror_results"], Fields::NONE).with_rows(NAME_ROW, 1, None)],
            },
        ],
        ordered: true,
    },
    Schema {
        file_type: FileType::MoveCopy,
        preamble: Preamble::KeywordName,
        unit_line: true,
        leading_rows: None,
        slots: &[Slot {
            name: "operation",
            occurs: Occurs::AtLeastOnce,
            kinds: &[
                LineSpec::new(
                    &["move"],
                    Fields::fixed(&[choice("type", OBJECT_TYPES), text("object"), text("target")]),
                ),
                LineSpec::new(
                    &["copy"],
                    Fields::optional(
                        &[choice("type", OBJECT_TYPES), text("object"), text("copy_name")],
                        &[text("target")],
                    ),
                ),
                LineSpec::new(&["remove"], Fields::fixed(&[choice("type", OBJECT_TYPES), text("object")])),
                LineSpec::new(
                    &["light_bulb"],
                    Fields::fixed(&[choice("type", OBJECT_TYPES), text("object"), choice("state", ON_OFF)]),
                ),
                LineSpec::new(
                    &["translate"],
                    Fields::fixed(&[
                        choice("type", OBJECT_TYPES),
                        text("object"),
                        number("tx"),
                        number("ty"),
                        number("tz"),
                    ]),
                ),
                LineSpec::new(
                    &["rotate"],
                    Fields::fixed(&[
                        choice("type", OBJECT_TYPES),
                        text("object"),
                        number("axis_x"),
                        number("axis_y"),
                        number("axis_z"),
                        number("angle"),
                    ]),
                ),
            ],
        }],
        ordered: false,
    },
    Schema {
        file_type: FileType::ModifyEdges,
        preamble: Preamble::KeywordName,
        unit_line: true,
        leading_rows: None,
        slots: &[Slot {
            name: "edge_operation",
            occurs: Occurs::AtLeastOnce,
            kinds: &[
                LineSpec::new(&["log_edges"], Fields::fixed(&[text("body")])),
                LineSpec::new(
                    &["fillet"],
                    Fields::repeated(&[text("body"), number("radius")], integer("edge"), 1),
                ),
                LineSpec::new(
                    &["chamfer"],
                    Fields::repeated(
                        &[text("body"), number("distance"), number("angle")],
                        integer("edge"),
                        1,
                    ),
                ),
            ],
        }],
        ordered: false,
    },
    Schema {
        file_type: FileType::Assembly,
        preamble: Preamble::KeywordThenGroup,
        unit_line: false,
        leading_rows: None,
        slots: &[Slot {
            name: "action",
            occurs: Occurs::AtLeastOnce,
            kinds: ASSEMBLY_ACTIONS,
        }],
        ordered: false,
    },
    Schema {
        file_type: FileType::Assemblies,
        preamble: Preamble::KeywordNameGroup,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "assembly_filenames",
                occurs: Occurs::Once,
                kinds: ASSEMBLY_FILENAMES,
            },
            Slot {
                name: "echo",
                occurs: Occurs::Any,
                kinds: ECHO_LINES,
            },
        ],
        ordered: false,
    },
    Schema {
        file_type: FileType::Design,
        preamble: Preamble::KeywordNameGroup,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "assembly_filenames",
                occurs: Occurs::Once,
                kinds: ASSEMBLY_FILENAMES,
            },
            Slot {
                name: "echo",
                occurs: Occurs::Any,
                kinds: ECHO_LINES,
            },
        ],
        ordered: false,
    },
    Schema {
        file_type: FileType::CrossRails,
        preamble: Preamble::Keyword,
        unit_line: false,
        leading_rows: None,
        slots: &[
            Slot {
                name: "rail_names",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["rail_names"], Fields::repeated(&[], text("rail"), 1))],
            },
            Slot {
                name: "profile_plane_normal",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["profile_plane_normal"], Fields::fixed(&[choice("axis", AXES)]))],
            },
            Slot {
                name: "rail_plane_normal",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(&["rail_plane_normal"], Fields::fixed(&[choice("axis", AXES)]))],
            },
            Slot {
                name: "rail_plane_offsets",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(
                    &["rail_plane_offsets"],
                    Fields::repeated(&[], number("offset"), 1),
                )],
            },
            Slot {
                name: "rail_segment_type",
                occurs: Occurs::Once,
                kinds: &[LineSpec::new(
                    &["rail_segment_type"],
                    Fields::fixed(&[choice("segment", SEGMENT_TYPES)]),
                )],
            },
        ],
        ordered: true,
    },
];

/// Schema of an action (or cross rails) block, `None` for directive blocks
pub fn schema_for(file_type: FileType) -> Option<&'static Schema> {
    SCHEMAS.iter().find(|schema| schema.file_type == file_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::split_line;

    fn line(raw: &str) -> Line {
        Line {
            number: 1,
            fields: split_line(raw).unwrap(),
        }
    }

    #[test]
    fn test_every_action_has_a_schema() {
        for file_type in FileType::ALL {
            assert_eq!(
                schema_for(file_type).is_some(),
                file_type.is_action() || file_type == FileType::CrossRails,
                "{}",
                file_type
            );
        }
    }

    #[test]
    fn test_two_word_keys() {
        let schema = schema_for(FileType::Extrude).unwrap();
        let (slot, kind) = schema.line_kind(&line("extent_type, distance, 10")).unwrap();
        assert_eq!(schema.slots[slot].name, "extent_type");
        assert_eq!(kind.name(), "extent_type, distance");
        assert!(schema.line_kind(&line("extent_type, sideways, 10")).is_none());
    }

    #[test]
    fn test_row_counts() {
        let arc = SEGMENTS.iter().find(|s| s.key == ["arc"]).unwrap();
        let rows = arc.rows.unwrap();
        assert!(rows.accepts(3) && !rows.accepts(2) && !rows.accepts(4));
        assert_eq!(rows.expected(), "3 rows");
    }

    #[test]
    fn test_assembly_accepts_echo() {
        let schema = schema_for(FileType::Assembly).unwrap();
        assert!(schema.line_kind(&line("echo, hello")).is_some());
        assert!(schema.line_kind(&line("run_extrude, parts")).is_some());
        assert!(schema.line_kind(&line("extrude, parts")).is_none());
    }
}
