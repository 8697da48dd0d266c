//! Roles, States and Attributes
//!
//! Node vocabulary shared by the accessibility tree and its consumers.

use std::collections::HashMap;

/// Accessible role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Role {
    // Landmark roles
    Banner,
    Complementary,
    ContentInfo,
    Form,
    Main,
    Navigation,
    Region,
    Search,

    // Widget roles
    Alert,
    AlertDialog,
    Button,
    CheckBox,
    ComboBox,
    Dialog,
    Link,
    ListBox,
    ListBoxOption,
    Menu,
    MenuBar,
    MenuItem,
    MenuListPopup,
    ProgressBar,
    RadioButton,
    RadioGroup,
    ScrollBar,
    SearchBox,
    Slider,
    SpinButton,
    Switch,
    Tab,
    TabList,
    TabPanel,
    TextField,
    ToggleButton,
    Tree,
    TreeItem,

    // Document structure
    Article,
    Cell,
    ColumnHeader,
    Definition,
    Figure,
    Grid,
    GridCell,
    Group,
    Heading,
    Image,
    List,
    ListItem,
    ListMarker,
    Paragraph,
    Row,
    RowGroup,
    RowHeader,
    Separator,
    Table,
    Term,
    Toolbar,

    // Text
    StaticText,
    InlineTextBox,
    LineBreak,

    // Roots and generic containers
    Application,
    Desktop,
    Document,
    GenericContainer,
    Pane,
    RootWebArea,
    Window,

    // Ignored
    Presentation,
    Unknown,
}

impl Role {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_lowercase().as_str() {
            "banner" => Self::Banner,
            "complementary" => Self::Complementary,
            "contentinfo" => Self::ContentInfo,
            "form" => Self::Form,
            "main" => Self::Main,
            "navigation" => Self::Navigation,
            "region" => Self::Region,
            "search" => Self::Search,
            "alert" => Self::Alert,
            "alertdialog" => Self::AlertDialog,
            "button" => Self::Button,
            "checkbox" => Self::CheckBox,
            "combobox" => Self::ComboBox,
            "dialog" => Self::Dialog,
            "link" => Self::Link,
            "listbox" => Self::ListBox,
            "option" | "listboxoption" => Self::ListBoxOption,
            "menu" => Self::Menu,
            "menubar" => Self::MenuBar,
            "menuitem" => Self::MenuItem,
            "menulistpopup" => Self::MenuListPopup,
            "progressbar" => Self::ProgressBar,
            "radio" | "radiobutton" => Self::RadioButton,
            "radiogroup" => Self::RadioGroup,
            "scrollbar" => Self::ScrollBar,
            "searchbox" => Self::SearchBox,
            "slider" => Self::Slider,
            "spinbutton" => Self::SpinButton,
            "switch" => Self::Switch,
            "tab" => Self::Tab,
            "tablist" => Self::TabList,
            "tabpanel" => Self::TabPanel,
            "textbox" | "textfield" => Self::TextField,
            "togglebutton" => Self::ToggleButton,
            "tree" => Self::Tree,
            "treeitem" => Self::TreeItem,
            "article" => Self::Article,
            "cell" => Self::Cell,
            "columnheader" => Self::ColumnHeader,
            "definition" => Self::Definition,
            "figure" => Self::Figure,
            "grid" => Self::Grid,
            "gridcell" => Self::GridCell,
            "group" => Self::Group,
            "heading" => Self::Heading,
            "img" | "image" => Self::Image,
            "list" => Self::List,
            "listitem" => Self::ListItem,
            "listmarker" => Self::ListMarker,
            "paragraph" => Self::Paragraph,
            "row" => Self::Row,
            "rowgroup" => Self::RowGroup,
            "rowheader" => Self::RowHeader,
            "separator" => Self::Separator,
            "table" => Self::Table,
            "term" => Self::Term,
            "toolbar" => Self::Toolbar,
            "statictext" => Self::StaticText,
            "inlinetextbox" => Self::InlineTextBox,
            "linebreak" => Self::LineBreak,
            "application" => Self::Application,
            "desktop" => Self::Desktop,
            "document" => Self::Document,
            "generic" | "genericcontainer" => Self::GenericContainer,
            "pane" => Self::Pane,
            "rootwebarea" => Self::RootWebArea,
            "window" => Self::Window,
            "none" | "presentation" => Self::Presentation,
            _ => return None,
        })
    }

    /// Check if role is a landmark
    pub fn is_landmark(&self) -> bool {
        matches!(self,
            Self::Banner | Self::Complementary | Self::ContentInfo |
            Self::Form | Self::Main | Self::Navigation | Self::Region | Self::Search
        )
    }

    /// Check if role is an interactive widget
    pub fn is_widget(&self) -> bool {
        matches!(self,
            Self::Button | Self::CheckBox | Self::ComboBox | Self::Link |
            Self::ListBox | Self::MenuItem | Self::RadioButton | Self::SearchBox |
            Self::Slider | Self::SpinButton | Self::Switch | Self::Tab |
            Self::TextField | Self::ToggleButton | Self::TreeItem
        )
    }

    /// Controls whose descendants are presentational.
    pub fn is_leaf_like(&self) -> bool {
        matches!(self,
            Self::Button | Self::CheckBox | Self::ComboBox | Self::Image |
            Self::ListMarker | Self::ProgressBar | Self::RadioButton | Self::ScrollBar |
            Self::SearchBox | Self::Slider | Self::SpinButton | Self::Switch |
            Self::TextField | Self::ToggleButton | Self::LineBreak | Self::Separator
        )
    }

    /// Structural containers that are never spoken as a whole.
    pub fn is_container(&self) -> bool {
        matches!(self,
            Self::Application | Self::Desktop | Self::Document | Self::Grid |
            Self::Group | Self::List | Self::Menu | Self::MenuBar | Self::Pane |
            Self::RadioGroup | Self::RootWebArea | Self::Row | Self::RowGroup |
            Self::TabList | Self::Table | Self::Toolbar | Self::Tree | Self::Window
        ) || self.is_landmark()
    }

    /// Table cells and headers
    pub fn is_cell_like(&self) -> bool {
        matches!(self, Self::Cell | Self::GridCell | Self::ColumnHeader | Self::RowHeader)
    }

    /// Roles that start a new visual line
    pub fn is_block(&self) -> bool {
        matches!(self,
            Self::Article | Self::Cell | Self::ColumnHeader | Self::Definition |
            Self::Figure | Self::GridCell | Self::Heading | Self::ListItem |
            Self::Paragraph | Self::RowHeader | Self::Term
        ) || self.is_container()
    }

    /// Roles that bound a document
    pub fn is_root(&self) -> bool {
        matches!(self,
            Self::Desktop | Self::Dialog | Self::AlertDialog | Self::Document |
            Self::RootWebArea | Self::Window
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::StaticText | Self::InlineTextBox)
    }
}

impl std::str::FromStr for Role {
    type Err = crate::A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::A11yError::InvalidRole(s.to_string()))
    }
}

/// Set of roles, one bit per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u128);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0u128;
        let mut i = 0;
        while i < roles.len() {
            bits |= 1u128 << (roles[i] as u8);
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn single(role: Role) -> Self {
        RoleSet(1u128 << (role as u8))
    }

    #[inline]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & (1u128 << (role as u8)) != 0
    }

    pub const fn union(self, other: RoleSet) -> Self {
        RoleSet(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Boolean node state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    Collapsed,
    Editable,
    Expanded,
    Focusable,
    Focused,
    Invalid,
    Invisible,
    Multiline,
    Offscreen,
    Protected,
    RichlyEditable,
    Visited,
}

/// Set of node states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateSet(u32);

impl StateSet {
    pub const fn empty() -> Self { StateSet(0) }

    pub fn with(mut self, state: State) -> Self {
        self.insert(state);
        self
    }

    pub fn insert(&mut self, state: State) { self.0 |= 1 << (state as u8); }
    pub fn remove(&mut self, state: State) { self.0 &= !(1 << (state as u8)); }

    #[inline]
    pub fn contains(self, state: State) -> bool {
        self.0 & (1 << (state as u8)) != 0
    }
}

impl FromIterator<State> for StateSet {
    fn from_iter<I: IntoIterator<Item = State>>(iter: I) -> Self {
        let mut set = StateSet::empty();
        for state in iter {
            set.insert(state);
        }
        set
    }
}

/// Interaction restriction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Restriction {
    #[default]
    None,
    ReadOnly,
    Disabled,
}

/// Attribute key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Name,
    Value,
    Url,
    HierarchicalLevel,
    TableCellRowIndex,
    TableCellColumnIndex,
    TableCellRowSpan,
    TableCellColumnSpan,
    Restriction,
}

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Int(i32),
    Restriction(Restriction),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        if let Self::Str(s) = self { Some(s) } else { None }
    }

    pub fn as_int(&self) -> Option<i32> {
        if let Self::Int(n) = self { Some(*n) } else { None }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self { Self::Str(s.to_string()) }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self { Self::Str(s) }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self { Self::Int(n) }
}

impl From<Restriction> for AttributeValue {
    fn from(r: Restriction) -> Self { Self::Restriction(r) }
}

/// Attribute map on a node
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    values: HashMap<Attribute, AttributeValue>,
}

impl Attributes {
    pub fn get(&self, key: Attribute) -> Option<&AttributeValue> {
        self.values.get(&key)
    }

    pub fn set(&mut self, key: Attribute, value: impl Into<AttributeValue>) {
        self.values.insert(key, value.into());
    }
}
