//! The LCDproc widget family
//!
//! Each widget kind is a plain struct holding its geometry and content.
//! Setters only touch local state; nothing reaches LCDd until the widget is
//! flushed through a [`WidgetHandle`](super::WidgetHandle), which always sends
//! the complete current state in the kind's fixed field order:
//!
//! | Kind | `widget_set` arguments |
//! |---|---|
//! | string | `x y "text"` |
//! | title | `"text"` |
//! | hbar / vbar | `x y length` |
//! | icon | `x y name` |
//! | scroller | `left top right bottom direction speed "text"` |
//! | frame | `left top right bottom width height direction speed` |
//! | num | `x value` |

use std::fmt;

use super::Command;

/// Behaviour shared by every widget kind
///
/// Kinds own their data, so handles may borrow them for any lifetime.
pub trait WidgetVariant: Into<Widget> + 'static {
    /// Type name used in `widget_add`
    const KIND: &'static str;

    /// Append the full widget state to a `widget_set` command
    fn write_state(&self, command: Command) -> Command;

    /// Borrow this kind out of a stored [`Widget`], if it is this kind
    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self>;
}

/// Scroll direction for scrollers and frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
    /// Scroller only: back-and-forth marquee
    Marquee,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
            Self::Marquee => "m",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text at a fixed position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringWidget {
    x: u16,
    y: u16,
    text: String,
}

impl StringWidget {
    pub fn new(x: u16, y: u16, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_x(&mut self, x: u16) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: u16) {
        self.y = y;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl WidgetVariant for StringWidget {
    const KIND: &'static str = "string";

    fn write_state(&self, command: Command) -> Command {
        command.arg(self.x).arg(self.y).quoted(&self.text)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::String(w) => Some(w),
            _ => None,
        }
    }
}

/// Screen title bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleWidget {
    text: String,
}

impl TitleWidget {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl WidgetVariant for TitleWidget {
    const KIND: &'static str = "title";

    fn write_state(&self, command: Command) -> Command {
        command.quoted(&self.text)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::Title(w) => Some(w),
            _ => None,
        }
    }
}

/// Bar geometry shared by horizontal and vertical bars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    x: u16,
    y: u16,
    /// Length in pixels
    length: u16,
}

impl Bar {
    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn set_x(&mut self, x: u16) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: u16) {
        self.y = y;
    }

    pub fn set_length(&mut self, length: u16) {
        self.length = length;
    }

    fn write_geometry(&self, command: Command) -> Command {
        command.arg(self.x).arg(self.y).arg(self.length)
    }
}

/// Horizontal bar growing to the right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HBarWidget(Bar);

impl HBarWidget {
    pub fn new(x: u16, y: u16, length: u16) -> Self {
        Self(Bar { x, y, length })
    }
}

impl std::ops::Deref for HBarWidget {
    type Target = Bar;

    fn deref(&self) -> &Bar {
        &self.0
    }
}

impl std::ops::DerefMut for HBarWidget {
    fn deref_mut(&mut self) -> &mut Bar {
        &mut self.0
    }
}

impl WidgetVariant for HBarWidget {
    const KIND: &'static str = "hbar";

    fn write_state(&self, command: Command) -> Command {
        self.0.write_geometry(command)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::HBar(w) => Some(w),
            _ => None,
        }
    }
}

/// Vertical bar growing upwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VBarWidget(Bar);

impl VBarWidget {
    pub fn new(x: u16, y: u16, length: u16) -> Self {
        Self(Bar { x, y, length })
    }
}

impl std::ops::Deref for VBarWidget {
    type Target = Bar;

    fn deref(&self) -> &Bar {
        &self.0
    }
}

impl std::ops::DerefMut for VBarWidget {
    fn deref_mut(&mut self) -> &mut Bar {
        &mut self.0
    }
}

impl WidgetVariant for VBarWidget {
    const KIND: &'static str = "vbar";

    fn write_state(&self, command: Command) -> Command {
        self.0.write_geometry(command)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::VBar(w) => Some(w),
            _ => None,
        }
    }
}

/// One of LCDd's named icons (`BLOCK_FILLED`, `SELECTOR_AT_LEFT`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconWidget {
    x: u16,
    y: u16,
    name: String,
}

impl IconWidget {
    pub fn new(x: u16, y: u16, name: impl Into<String>) -> Self {
        Self {
            x,
            y,
            name: name.into(),
        }
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_x(&mut self, x: u16) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: u16) {
        self.y = y;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl WidgetVariant for IconWidget {
    const KIND: &'static str = "icon";

    fn write_state(&self, command: Command) -> Command {
        command.arg(self.x).arg(self.y).arg(&self.name)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::Icon(w) => Some(w),
            _ => None,
        }
    }
}

/// Text scrolling inside a rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollerWidget {
    left: u16,
    top: u16,
    right: u16,
    bottom: u16,
    direction: Direction,
    /// Frames per scroll step; higher is slower
    speed: u16,
    text: String,
}

impl ScrollerWidget {
    pub fn new(left: u16, top: u16, right: u16, bottom: u16, text: impl Into<String>) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            direction: Direction::Horizontal,
            speed: 1,
            text: text.into(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> u16 {
        self.speed
    }

    pub fn set_left(&mut self, left: u16) {
        self.left = left;
    }

    pub fn set_top(&mut self, top: u16) {
        self.top = top;
    }

    pub fn set_right(&mut self, right: u16) {
        self.right = right;
    }

    pub fn set_bottom(&mut self, bottom: u16) {
        self.bottom = bottom;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn set_speed(&mut self, speed: u16) {
        self.speed = speed;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl WidgetVariant for ScrollerWidget {
    const KIND: &'static str = "scroller";

    fn write_state(&self, command: Command) -> Command {
        command
            .arg(self.left)
            .arg(self.top)
            .arg(self.right)
            .arg(self.bottom)
            .arg(self.direction)
            .arg(self.speed)
            .quoted(&self.text)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::Scroller(w) => Some(w),
            _ => None,
        }
    }
}

/// A scrollable viewport onto a larger virtual area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameWidget {
    left: u16,
    top: u16,
    right: u16,
    bottom: u16,
    width: u16,
    height: u16,
    direction: Direction,
    speed: u16,
}

impl FrameWidget {
    pub fn new(left: u16, top: u16, right: u16, bottom: u16, width: u16, height: u16) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            width,
            height,
            direction: Direction::Vertical,
            speed: 1,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn set_left(&mut self, left: u16) {
        self.left = left;
    }

    pub fn set_top(&mut self, top: u16) {
        self.top = top;
    }

    pub fn set_right(&mut self, right: u16) {
        self.right = right;
    }

    pub fn set_bottom(&mut self, bottom: u16) {
        self.bottom = bottom;
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    pub fn set_height(&mut self, height: u16) {
        self.height = height;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn set_speed(&mut self, speed: u16) {
        self.speed = speed;
    }
}

impl WidgetVariant for FrameWidget {
    const KIND: &'static str = "frame";

    fn write_state(&self, command: Command) -> Command {
        command
            .arg(self.left)
            .arg(self.top)
            .arg(self.right)
            .arg(self.bottom)
            .arg(self.width)
            .arg(self.height)
            .arg(self.direction)
            .arg(self.speed)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::Frame(w) => Some(w),
            _ => None,
        }
    }
}

/// Big digit spanning the full display height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberWidget {
    x: u16,
    /// 0-9, or 10 for a colon
    value: u8,
}

impl NumberWidget {
    pub fn new(x: u16, value: u8) -> Self {
        Self { x, value }
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set_x(&mut self, x: u16) {
        self.x = x;
    }

    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }
}

impl WidgetVariant for NumberWidget {
    const KIND: &'static str = "num";

    fn write_state(&self, command: Command) -> Command {
        command.arg(self.x).arg(self.value)
    }

    fn from_widget_mut(widget: &mut Widget) -> Option<&mut Self> {
        match widget {
            Widget::Number(w) => Some(w),
            _ => None,
        }
    }
}

/// Any widget stored on a screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    String(StringWidget),
    Title(TitleWidget),
    HBar(HBarWidget),
    VBar(VBarWidget),
    Icon(IconWidget),
    Scroller(ScrollerWidget),
    Frame(FrameWidget),
    Number(NumberWidget),
}

macro_rules! kind_of {
    ($widget:expr) => {
        match $widget {
            Widget::String(_) => StringWidget::KIND,
            Widget::Title(_) => TitleWidget::KIND,
            Widget::HBar(_) => HBarWidget::KIND,
            Widget::VBar(_) => VBarWidget::KIND,
            Widget::Icon(_) => IconWidget::KIND,
            Widget::Scroller(_) => ScrollerWidget::KIND,
            Widget::Frame(_) => FrameWidget::KIND,
            Widget::Number(_) => NumberWidget::KIND,
        }
    };
}

impl Widget {
    /// Type name used in `widget_add`
    pub fn kind(&self) -> &'static str {
        kind_of!(self)
    }

    /// The registration command for this widget
    pub fn add_command(&self, screen: &str, id: &str) -> Command {
        Command::widget_add(screen, id, self.kind())
    }
}

impl From<StringWidget> for Widget {
    fn from(w: StringWidget) -> Self {
        Widget::String(w)
    }
}

impl From<TitleWidget> for Widget {
    fn from(w: TitleWidget) -> Self {
        Widget::Title(w)
    }
}

impl From<HBarWidget> for Widget {
    fn from(w: HBarWidget) -> Self {
        Widget::HBar(w)
    }
}

impl From<VBarWidget> for Widget {
    fn from(w: VBarWidget) -> Self {
        Widget::VBar(w)
    }
}

impl From<IconWidget> for Widget {
    fn from(w: IconWidget) -> Self {
        Widget::Icon(w)
    }
}

impl From<ScrollerWidget> for Widget {
    fn from(w: ScrollerWidget) -> Self {
        Widget::Scroller(w)
    }
}

impl From<FrameWidget> for Widget {
    fn from(w: FrameWidget) -> Self {
        Widget::Frame(w)
    }
}

impl From<NumberWidget> for Widget {
    fn from(w: NumberWidget) -> Self {
        Widget::Number(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_line<W: WidgetVariant>(widget: W) -> String {
        widget.write_state(Command::widget_set("scr", "w")).to_string()
    }

    #[test]
    fn test_add_commands_name_the_kind() {
        let cases: Vec<(Widget, &str)> = vec![
            (StringWidget::new(1, 1, "").into(), "string"),
            (TitleWidget::new("").into(), "title"),
            (HBarWidget::new(1, 1, 0).into(), "hbar"),
            (VBarWidget::new(1, 1, 0).into(), "vbar"),
            (IconWidget::new(1, 1, "BLOCK_FILLED").into(), "icon"),
            (ScrollerWidget::new(1, 1, 20, 1, "").into(), "scroller"),
            (FrameWidget::new(1, 1, 20, 4, 20, 8).into(), "frame"),
            (NumberWidget::new(1, 0).into(), "num"),
        ];

        for (widget, kind) in cases {
            assert_eq!(
                widget.add_command("scr", "w").to_string(),
                format!("widget_add scr w {}", kind)
            );
        }
    }

    #[test]
    fn test_string_set_order() {
        assert_eq!(
            set_line(StringWidget::new(3, 2, "hello")),
            "widget_set scr w 3 2 \"hello\""
        );
    }

    #[test]
    fn test_title_set_order() {
        assert_eq!(set_line(TitleWidget::new("Prusa MK4")), "widget_set scr w \"Prusa MK4\"");
    }

    #[test]
    fn test_bar_set_order() {
        assert_eq!(set_line(HBarWidget::new(1, 4, 50)), "widget_set scr w 1 4 50");
        assert_eq!(set_line(VBarWidget::new(20, 4, 16)), "widget_set scr w 20 4 16");
    }

    #[test]
    fn test_icon_set_order() {
        assert_eq!(
            set_line(IconWidget::new(1, 2, "SELECTOR_AT_RIGHT")),
            "widget_set scr w 1 2 SELECTOR_AT_RIGHT"
        );
    }

    #[test]
    fn test_scroller_set_order() {
        let scroller = ScrollerWidget::new(1, 1, 15, 1, "benchy.gcode")
            .with_direction(Direction::Marquee)
            .with_speed(5);
        assert_eq!(
            set_line(scroller),
            "widget_set scr w 1 1 15 1 m 5 \"benchy.gcode\""
        );
    }

    #[test]
    fn test_frame_set_order() {
        let frame = FrameWidget::new(1, 2, 20, 4, 20, 6).with_speed(2);
        assert_eq!(set_line(frame), "widget_set scr w 1 2 20 4 20 6 v 2");
    }

    #[test]
    fn test_number_set_order() {
        assert_eq!(set_line(NumberWidget::new(7, 10)), "widget_set scr w 7 10");
    }

    #[test]
    fn test_setters_change_full_state_without_diffing() {
        let mut widget = StringWidget::new(1, 1, "a");
        widget.set_x(5);
        widget.set_text("b");

        // y was never touched but is still serialized
        assert_eq!(set_line(widget), "widget_set scr w 5 1 \"b\"");
    }

    #[test]
    fn test_from_widget_mut_matches_kind() {
        let mut widget: Widget = HBarWidget::new(1, 1, 1).into();
        assert!(HBarWidget::from_widget_mut(&mut widget).is_some());
        assert!(VBarWidget::from_widget_mut(&mut widget).is_none());
        assert!(StringWidget::from_widget_mut(&mut widget).is_none());
    }
}
