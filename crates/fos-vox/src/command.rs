//! Commands
//!
//! The named user commands and the static table describing how each one
//! moves the current range.

use serde::{Deserialize, Serialize};

use crate::cursor::CursorUnit;
use crate::predicate::Predicate;
use crate::table::Axis;
use crate::traversal::Direction;

macro_rules! commands {
    ($($variant:ident => $name:literal,)*) => {
        /// User command
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum Command {
            $($variant,)*
        }

        impl Command {
            /// Every command, in table order
            pub const ALL: &'static [Command] = &[$(Command::$variant,)*];

            /// Command name as used in key bindings
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)*
                }
            }

            /// Look up a command by name
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Command::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

commands! {
    NextCharacter => "nextCharacter",
    PreviousCharacter => "previousCharacter",
    NextWord => "nextWord",
    PreviousWord => "previousWord",
    NextLine => "nextLine",
    PreviousLine => "previousLine",
    NextObject => "nextObject",
    PreviousObject => "previousObject",
    Forward => "forward",
    Backward => "backward",
    Right => "right",
    Left => "left",
    NextButton => "nextButton",
    PreviousButton => "previousButton",
    NextCheckbox => "nextCheckbox",
    PreviousCheckbox => "previousCheckbox",
    NextComboBox => "nextComboBox",
    PreviousComboBox => "previousComboBox",
    NextEditText => "nextEditText",
    PreviousEditText => "previousEditText",
    NextFormField => "nextFormField",
    PreviousFormField => "previousFormField",
    NextGraphic => "nextGraphic",
    PreviousGraphic => "previousGraphic",
    NextHeading => "nextHeading",
    PreviousHeading => "previousHeading",
    NextHeading1 => "nextHeading1",
    PreviousHeading1 => "previousHeading1",
    NextHeading2 => "nextHeading2",
    PreviousHeading2 => "previousHeading2",
    NextHeading3 => "nextHeading3",
    PreviousHeading3 => "previousHeading3",
    NextHeading4 => "nextHeading4",
    PreviousHeading4 => "previousHeading4",
    NextHeading5 => "nextHeading5",
    PreviousHeading5 => "previousHeading5",
    NextHeading6 => "nextHeading6",
    PreviousHeading6 => "previousHeading6",
    NextLink => "nextLink",
    PreviousLink => "previousLink",
    NextVisitedLink => "nextVisitedLink",
    PreviousVisitedLink => "previousVisitedLink",
    NextTable => "nextTable",
    PreviousTable => "previousTable",
    NextLandmark => "nextLandmark",
    PreviousLandmark => "previousLandmark",
    NextGroup => "nextGroup",
    PreviousGroup => "previousGroup",
    NextSimilarItem => "nextSimilarItem",
    PreviousSimilarItem => "previousSimilarItem",
    NextInvalidItem => "nextInvalidItem",
    PreviousInvalidItem => "previousInvalidItem",
    NextList => "nextList",
    PreviousList => "previousList",
    NextRow => "nextRow",
    PreviousRow => "previousRow",
    NextCol => "nextCol",
    PreviousCol => "previousCol",
    GoToColFirstCell => "goToColFirstCell",
    GoToColLastCell => "goToColLastCell",
    GoToRowFirstCell => "goToRowFirstCell",
    GoToRowLastCell => "goToRowLastCell",
    GoToFirstCell => "goToFirstCell",
    GoToLastCell => "goToLastCell",
    JumpToTop => "jumpToTop",
    JumpToBottom => "jumpToBottom",
    JumpToDetails => "jumpToDetails",
    ReadFromHere => "readFromHere",
    PassThroughMode => "passThroughMode",
    ToggleStickyMode => "toggleStickyMode",
    StopSpeech => "stopSpeech",
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a jump's predicate comes from
#[derive(Debug, Clone, Copy)]
pub enum PredicateSource {
    Fixed(Predicate),
    /// Role of the current node, past wrapper roles
    SimilarItem,
    /// Lists other than the one around the current node
    List,
    /// Cell adjacent to the current cell along an axis
    TableCell(Axis),
    /// Cell in the current cell's column
    ColumnEnd,
}

/// Where a jump starts searching from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpStart {
    /// The current range's bound in the jump direction
    Bound,
    /// First child of the enclosing table
    TableFirstChild,
    /// Deepest last cell of the enclosing table, which may itself match
    TableLastCell,
}

/// Predicate-driven search parameters
#[derive(Debug, Clone, Copy)]
pub struct JumpSpec {
    pub direction: Direction,
    pub predicate: PredicateSource,
    pub root: Predicate,
    pub should_wrap: bool,
    pub skip_sync: bool,
    pub skip_initial_ancestry: bool,
    pub error_message: Option<&'static str>,
    /// Latch the host out of mode switching until the command finishes
    pub suppress_mode_toggle: bool,
    pub start: JumpStart,
}

impl JumpSpec {
    fn new(direction: Direction, predicate: PredicateSource) -> Self {
        Self {
            direction,
            predicate,
            root: Predicate::RootOrEditableRoot,
            should_wrap: true,
            skip_sync: false,
            skip_initial_ancestry: true,
            error_message: None,
            suppress_mode_toggle: false,
            start: JumpStart::Bound,
        }
    }

    fn error(mut self, message: &'static str) -> Self {
        self.error_message = Some(message);
        self
    }

    fn root(mut self, root: Predicate) -> Self {
        self.root = root;
        self
    }

    fn no_wrap(mut self) -> Self {
        self.should_wrap = false;
        self
    }

    fn skip_sync(mut self) -> Self {
        self.skip_sync = true;
        self
    }

    fn keep_ancestry(mut self) -> Self {
        self.skip_initial_ancestry = false;
        self
    }

    fn latch(mut self) -> Self {
        self.suppress_mode_toggle = true;
        self
    }

    fn start(mut self, start: JumpStart) -> Self {
        self.start = start;
        self
    }
}

/// Jumps that compute their target directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectJump {
    Top,
    Bottom,
    Details,
    RowFirstCell,
    RowLastCell,
    FirstCell,
    LastCell,
}

/// How a command moves the range
#[derive(Debug, Clone, Copy)]
pub enum Motion {
    Unit(CursorUnit, Direction),
    Jump(JumpSpec),
    Direct(DirectJump),
}

fn fixed(direction: Direction, pred: Predicate) -> JumpSpec {
    JumpSpec::new(direction, PredicateSource::Fixed(pred))
}

fn cell(direction: Direction, axis: Axis, root: Predicate) -> JumpSpec {
    JumpSpec::new(direction, PredicateSource::TableCell(axis)).root(root).no_wrap().skip_sync()
}

impl Command {
    /// Motion table entry; `None` for commands that do not move the range.
    pub fn motion(&self) -> Option<Motion> {
        use Direction::{Backward as B, Forward as F};
        use Motion::{Direct, Jump, Unit};

        let motion = match self {
            Self::NextCharacter => Unit(CursorUnit::Character, F),
            Self::PreviousCharacter => Unit(CursorUnit::Character, B),
            Self::NextWord => Unit(CursorUnit::Word, F),
            Self::PreviousWord => Unit(CursorUnit::Word, B),
            Self::NextLine | Self::Forward => Unit(CursorUnit::Line, F),
            Self::PreviousLine | Self::Backward => Unit(CursorUnit::Line, B),
            Self::NextObject | Self::Right => Unit(CursorUnit::Node, F),
            Self::PreviousObject | Self::Left => Unit(CursorUnit::Node, B),

            Self::NextButton => Jump(fixed(F, Predicate::Button).error("no_next_button")),
            Self::PreviousButton => Jump(fixed(B, Predicate::Button).error("no_previous_button")),
            Self::NextCheckbox => Jump(fixed(F, Predicate::CheckBox).error("no_next_checkbox")),
            Self::PreviousCheckbox => Jump(fixed(B, Predicate::CheckBox).error("no_previous_checkbox")),
            Self::NextComboBox => Jump(fixed(F, Predicate::ComboBox).error("no_next_combo_box")),
            Self::PreviousComboBox => Jump(fixed(B, Predicate::ComboBox).error("no_previous_combo_box")),
            Self::NextEditText => Jump(fixed(F, Predicate::EditText).error("no_next_edit_text").latch()),
            Self::PreviousEditText => Jump(fixed(B, Predicate::EditText).error("no_previous_edit_text").latch()),
            Self::NextFormField => Jump(fixed(F, Predicate::FormField).error("no_next_form_field").latch()),
            Self::PreviousFormField => Jump(fixed(B, Predicate::FormField).error("no_previous_form_field").latch()),
            Self::NextGraphic => Jump(fixed(F, Predicate::Image).error("no_next_graphic")),
            Self::PreviousGraphic => Jump(fixed(B, Predicate::Image).error("no_previous_graphic")),
            Self::NextHeading => Jump(fixed(F, Predicate::Heading(None)).error("no_next_heading")),
            Self::PreviousHeading => Jump(fixed(B, Predicate::Heading(None)).error("no_previous_heading")),
            Self::NextHeading1 => Jump(fixed(F, Predicate::Heading(Some(1))).error("no_next_heading_1")),
            Self::PreviousHeading1 => Jump(fixed(B, Predicate::Heading(Some(1))).error("no_previous_heading_1")),
            Self::NextHeading2 => Jump(fixed(F, Predicate::Heading(Some(2))).error("no_next_heading_2")),
            Self::PreviousHeading2 => Jump(fixed(B, Predicate::Heading(Some(2))).error("no_previous_heading_2")),
            Self::NextHeading3 => Jump(fixed(F, Predicate::Heading(Some(3))).error("no_next_heading_3")),
            Self::PreviousHeading3 => Jump(fixed(B, Predicate::Heading(Some(3))).error("no_previous_heading_3")),
            Self::NextHeading4 => Jump(fixed(F, Predicate::Heading(Some(4))).error("no_next_heading_4")),
            Self::PreviousHeading4 => Jump(fixed(B, Predicate::Heading(Some(4))).error("no_previous_heading_4")),
            Self::NextHeading5 => Jump(fixed(F, Predicate::Heading(Some(5))).error("no_next_heading_5")),
            Self::PreviousHeading5 => Jump(fixed(B, Predicate::Heading(Some(5))).error("no_previous_heading_5")),
            Self::NextHeading6 => Jump(fixed(F, Predicate::Heading(Some(6))).error("no_next_heading_6")),
            Self::PreviousHeading6 => Jump(fixed(B, Predicate::Heading(Some(6))).error("no_previous_heading_6")),
            Self::NextLink => Jump(fixed(F, Predicate::Link).error("no_next_link")),
            Self::PreviousLink => Jump(fixed(B, Predicate::Link).error("no_previous_link")),
            Self::NextVisitedLink => Jump(fixed(F, Predicate::VisitedLink).error("no_next_visited_link")),
            Self::PreviousVisitedLink => Jump(fixed(B, Predicate::VisitedLink).error("no_previous_visited_link")),
            Self::NextTable => Jump(fixed(F, Predicate::Table).error("no_next_table")),
            Self::PreviousTable => Jump(fixed(B, Predicate::Table).error("no_previous_table")),
            Self::NextLandmark => Jump(fixed(F, Predicate::Landmark).error("no_next_landmark")),
            Self::PreviousLandmark => Jump(fixed(B, Predicate::Landmark).error("no_previous_landmark")),
            Self::NextGroup => Jump(fixed(F, Predicate::Group).skip_sync()),
            Self::PreviousGroup => Jump(fixed(B, Predicate::Group).skip_sync()),
            Self::NextSimilarItem => Jump(JumpSpec::new(F, PredicateSource::SimilarItem).skip_sync()),
            Self::PreviousSimilarItem => Jump(JumpSpec::new(B, PredicateSource::SimilarItem).skip_sync()),
            Self::NextInvalidItem => Jump(fixed(F, Predicate::Invalid).root(Predicate::Root).error("no_invalid_item")),
            Self::PreviousInvalidItem => {
                Jump(fixed(B, Predicate::Invalid).root(Predicate::Root).error("no_invalid_item"))
            }
            Self::NextList => Jump(JumpSpec::new(F, PredicateSource::List).error("no_next_list")),
            Self::PreviousList => {
                Jump(JumpSpec::new(B, PredicateSource::List).error("no_previous_list").keep_ancestry())
            }

            Self::NextRow => Jump(cell(F, Axis::Row, Predicate::Table).error("no_cell_below")),
            Self::PreviousRow => Jump(cell(B, Axis::Row, Predicate::Table).error("no_cell_above")),
            Self::NextCol => Jump(cell(F, Axis::Col, Predicate::Row).error("no_cell_right")),
            Self::PreviousCol => Jump(cell(B, Axis::Col, Predicate::Row).error("no_cell_left")),
            Self::GoToColFirstCell => Jump(
                JumpSpec::new(F, PredicateSource::ColumnEnd)
                    .root(Predicate::Table)
                    .no_wrap()
                    .skip_sync()
                    .start(JumpStart::TableFirstChild)
                    .error("no_cell_above"),
            ),
            Self::GoToColLastCell => Jump(
                JumpSpec::new(B, PredicateSource::ColumnEnd)
                    .root(Predicate::Table)
                    .no_wrap()
                    .skip_sync()
                    .start(JumpStart::TableLastCell)
                    .error("no_cell_below"),
            ),

            Self::GoToRowFirstCell => Direct(DirectJump::RowFirstCell),
            Self::GoToRowLastCell => Direct(DirectJump::RowLastCell),
            Self::GoToFirstCell => Direct(DirectJump::FirstCell),
            Self::GoToLastCell => Direct(DirectJump::LastCell),
            Self::JumpToTop => Direct(DirectJump::Top),
            Self::JumpToBottom => Direct(DirectJump::Bottom),
            Self::JumpToDetails => Direct(DirectJump::Details),

            Self::ReadFromHere | Self::PassThroughMode | Self::ToggleStickyMode | Self::StopSpeech => {
                return None;
            }
        };
        Some(motion)
    }

    /// Handled by the session rather than the dispatcher
    pub fn is_session_command(&self) -> bool {
        matches!(self, Self::ReadFromHere | Self::PassThroughMode | Self::ToggleStickyMode | Self::StopSpeech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for &command in Command::ALL {
            assert_eq!(Command::parse(command.as_str()), Some(command));
            let json = serde_json::to_string(&command).unwrap();
            assert_eq!(json, format!("\"{}\"", command.as_str()));
        }
        assert_eq!(Command::parse("nextHeading"), Some(Command::NextHeading));
        assert_eq!(Command::parse("noSuchCommand"), None);
    }

    #[test]
    fn test_session_commands_have_no_motion() {
        for &command in Command::ALL {
            assert_eq!(command.motion().is_none(), command.is_session_command(), "{command}");
        }
    }

    #[test]
    fn test_table_defaults() {
        let Some(Motion::Jump(spec)) = Command::NextHeading.motion() else {
            panic!("expected a jump");
        };
        assert!(spec.should_wrap && spec.skip_initial_ancestry && !spec.skip_sync);
        assert_eq!(spec.direction, Direction::Forward);
        assert_eq!(spec.error_message, Some("no_next_heading"));
        assert!(matches!(spec.root, Predicate::RootOrEditableRoot));

        let Some(Motion::Jump(spec)) = Command::PreviousList.motion() else {
            panic!("expected a jump");
        };
        assert!(!spec.skip_initial_ancestry);

        let Some(Motion::Jump(spec)) = Command::NextCol.motion() else {
            panic!("expected a jump");
        };
        assert!(!spec.should_wrap && spec.skip_sync);
        assert!(matches!(spec.root, Predicate::Row));

        let Some(Motion::Jump(spec)) = Command::NextEditText.motion() else {
            panic!("expected a jump");
        };
        assert!(spec.suppress_mode_toggle);
    }

    #[test]
    fn test_aliases() {
        assert!(matches!(Command::Right.motion(), Some(Motion::Unit(CursorUnit::Node, Direction::Forward))));
        assert!(matches!(Command::Backward.motion(), Some(Motion::Unit(CursorUnit::Line, Direction::Backward))));
    }
}
