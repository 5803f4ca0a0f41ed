//! Screens and the handles used to mutate them

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use printlcd_config::Priority;
use tracing::debug;

use super::widget::{
    Direction, FrameWidget, HBarWidget, IconWidget, NumberWidget, ScrollerWidget, StringWidget,
    TitleWidget, VBarWidget, Widget, WidgetVariant,
};
use super::{Command, Connection, LcdError};

/// Whether LCDd draws its heartbeat indicator on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heartbeat {
    On,
    Off,
}

impl Heartbeat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local mirror of a screen registered with LCDd
///
/// Owns its widgets. Widget ids are unique within the screen.
#[derive(Debug)]
pub struct Screen {
    id: String,
    priority: Priority,
    heartbeat: Heartbeat,
    widgets: HashMap<String, Widget>,
}

impl Screen {
    pub(crate) fn new(id: &str) -> Self {
        // LCDd's defaults for a fresh screen
        Self {
            id: id.to_string(),
            priority: Priority::Info,
            heartbeat: Heartbeat::On,
            widgets: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn heartbeat(&self) -> Heartbeat {
        self.heartbeat
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }
}

/// Mutable access to a screen together with the connection it lives on
///
/// Obtained from [`Session::add_screen`](super::Session::add_screen) or
/// [`Session::screen`](super::Session::screen).
pub struct ScreenHandle<'a> {
    pub(crate) connection: &'a mut Connection,
    pub(crate) screen: &'a mut Screen,
}

impl<'a> ScreenHandle<'a> {
    pub fn screen(&self) -> &Screen {
        self.screen
    }

    pub fn id(&self) -> &str {
        &self.screen.id
    }

    /// Change the screen priority on LCDd
    pub async fn set_priority(&mut self, priority: Priority) -> Result<(), LcdError> {
        let command = Command::new("screen_set")
            .arg(&self.screen.id)
            .arg("-priority")
            .arg(priority);
        self.connection.request(&command).await?;
        self.screen.priority = priority;
        Ok(())
    }

    /// Toggle LCDd's heartbeat indicator on this screen
    pub async fn set_heartbeat(&mut self, heartbeat: Heartbeat) -> Result<(), LcdError> {
        let command = Command::new("screen_set")
            .arg(&self.screen.id)
            .arg("-heartbeat")
            .arg(heartbeat);
        self.connection.request(&command).await?;
        self.screen.heartbeat = heartbeat;
        Ok(())
    }

    /// Register a widget on this screen
    ///
    /// Sends exactly one `widget_add`, then one `widget_set` carrying the
    /// initial state. The id is checked locally first: a duplicate is rejected
    /// without any traffic.
    ///
    /// # Errors
    ///
    /// Returns `LcdError::DuplicateWidget` if `id` is already used on this
    /// screen. If the `widget_add` fails the widget is not stored; if only the
    /// initial `widget_set` fails the widget stays registered and the error is
    /// returned.
    pub async fn add_widget<'b, W: WidgetVariant>(
        &'b mut self,
        id: &'b str,
        widget: W,
    ) -> Result<WidgetHandle<'b, W>, LcdError> {
        let screen_id = self.screen.id.as_str();

        let slot = match self.screen.widgets.entry(id.to_string()) {
            Entry::Occupied(_) => {
                return Err(LcdError::DuplicateWidget {
                    screen: screen_id.to_string(),
                    widget: id.to_string(),
                })
            }
            Entry::Vacant(slot) => slot,
        };

        let widget: Widget = widget.into();
        self.connection
            .request(&widget.add_command(screen_id, id))
            .await?;

        debug!(screen = screen_id, widget = id, kind = W::KIND, "Widget added");

        let stored = W::from_widget_mut(slot.insert(widget)).ok_or_else(|| {
            LcdError::WidgetKindMismatch {
                widget: id.to_string(),
                expected: W::KIND,
                actual: "unknown",
            }
        })?;

        let mut handle = WidgetHandle {
            connection: &mut *self.connection,
            screen_id,
            id,
            widget: stored,
        };
        handle.update().await?;
        Ok(handle)
    }

    pub async fn add_string_widget<'b>(
        &'b mut self,
        id: &'b str,
        x: u16,
        y: u16,
        text: &str,
    ) -> Result<WidgetHandle<'b, StringWidget>, LcdError> {
        self.add_widget(id, StringWidget::new(x, y, text)).await
    }

    pub async fn add_title_widget<'b>(
        &'b mut self,
        id: &'b str,
        text: &str,
    ) -> Result<WidgetHandle<'b, TitleWidget>, LcdError> {
        self.add_widget(id, TitleWidget::new(text)).await
    }

    pub async fn add_hbar_widget<'b>(
        &'b mut self,
        id: &'b str,
        x: u16,
        y: u16,
        length: u16,
    ) -> Result<WidgetHandle<'b, HBarWidget>, LcdError> {
        self.add_widget(id, HBarWidget::new(x, y, length)).await
    }

    pub async fn add_vbar_widget<'b>(
        &'b mut self,
        id: &'b str,
        x: u16,
        y: u16,
        length: u16,
    ) -> Result<WidgetHandle<'b, VBarWidget>, LcdError> {
        self.add_widget(id, VBarWidget::new(x, y, length)).await
    }

    pub async fn add_icon_widget<'b>(
        &'b mut self,
        id: &'b str,
        x: u16,
        y: u16,
        name: &str,
    ) -> Result<WidgetHandle<'b, IconWidget>, LcdError> {
        self.add_widget(id, IconWidget::new(x, y, name)).await
    }

    /// Scroller with the given direction and speed
    #[allow(clippy::too_many_arguments)]
    pub async fn add_scroller_widget<'b>(
        &'b mut self,
        id: &'b str,
        left: u16,
        top: u16,
        right: u16,
        bottom: u16,
        direction: Direction,
        speed: u16,
        text: &str,
    ) -> Result<WidgetHandle<'b, ScrollerWidget>, LcdError> {
        let scroller = ScrollerWidget::new(left, top, right, bottom, text)
            .with_direction(direction)
            .with_speed(speed);
        self.add_widget(id, scroller).await
    }

    /// Vertical frame with a `width` x `height` virtual area
    #[allow(clippy::too_many_arguments)]
    pub async fn add_frame_widget<'b>(
        &'b mut self,
        id: &'b str,
        left: u16,
        top: u16,
        right: u16,
        bottom: u16,
        width: u16,
        height: u16,
    ) -> Result<WidgetHandle<'b, FrameWidget>, LcdError> {
        self.add_widget(id, FrameWidget::new(left, top, right, bottom, width, height))
            .await
    }

    pub async fn add_number_widget<'b>(
        &'b mut self,
        id: &'b str,
        x: u16,
        value: u8,
    ) -> Result<WidgetHandle<'b, NumberWidget>, LcdError> {
        self.add_widget(id, NumberWidget::new(x, value)).await
    }

    /// Typed access to an existing widget. No I/O.
    pub fn widget<'b, W: WidgetVariant>(
        &'b mut self,
        id: &'b str,
    ) -> Result<WidgetHandle<'b, W>, LcdError> {
        let screen_id = self.screen.id.as_str();
        let widget = self
            .screen
            .widgets
            .get_mut(id)
            .ok_or_else(|| LcdError::UnknownWidget {
                screen: screen_id.to_string(),
                widget: id.to_string(),
            })?;

        let actual = widget.kind();
        let widget = W::from_widget_mut(widget).ok_or_else(|| LcdError::WidgetKindMismatch {
            widget: id.to_string(),
            expected: W::KIND,
            actual,
        })?;

        Ok(WidgetHandle {
            connection: &mut *self.connection,
            screen_id,
            id,
            widget,
        })
    }
}

/// Typed access to one widget on a screen
///
/// Derefs to the widget so its setters can be called directly. Setters only
/// change local state; [`update`](Self::update) sends the full state.
pub struct WidgetHandle<'a, W> {
    connection: &'a mut Connection,
    screen_id: &'a str,
    id: &'a str,
    widget: &'a mut W,
}

impl<'a, W: WidgetVariant> WidgetHandle<'a, W> {
    pub fn id(&self) -> &str {
        self.id
    }

    /// Send the widget's complete current state to LCDd
    pub async fn update(&mut self) -> Result<(), LcdError> {
        let command = self
            .widget
            .write_state(Command::widget_set(self.screen_id, self.id));
        self.connection.request(&command).await?;
        Ok(())
    }
}

impl<'a, W> std::ops::Deref for WidgetHandle<'a, W> {
    type Target = W;

    fn deref(&self) -> &W {
        self.widget
    }
}

impl<'a, W> std::ops::DerefMut for WidgetHandle<'a, W> {
    fn deref_mut(&mut self) -> &mut W {
        self.widget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcdproc::mock::MockLcdd;
    use crate::lcdproc::Session;

    async fn session_with_screen(lcdd: &MockLcdd) -> Session {
        let mut session = Session::start(lcdd.host(), lcdd.port()).await.unwrap();
        session.add_screen("scr").await.unwrap();
        lcdd.take_commands();
        session
    }

    #[tokio::test]
    async fn test_every_kind_adds_before_set() {
        let lcdd = MockLcdd::start().await;
        let mut session = session_with_screen(&lcdd).await;
        let mut screen = session.screen("scr").unwrap();

        screen.add_string_widget("s", 1, 1, "txt").await.unwrap();
        screen.add_title_widget("t", "title").await.unwrap();
        screen.add_hbar_widget("hb", 1, 2, 10).await.unwrap();
        screen.add_vbar_widget("vb", 20, 4, 8).await.unwrap();
        screen.add_icon_widget("i", 1, 3, "HEART_FILLED").await.unwrap();
        screen
            .add_scroller_widget("sc", 1, 4, 20, 4, Direction::Marquee, 3, "scroll")
            .await
            .unwrap();
        screen
            .add_frame_widget("f", 1, 1, 20, 4, 20, 8)
            .await
            .unwrap();
        screen.add_number_widget("n", 5, 3).await.unwrap();

        let commands = lcdd.take_commands();
        assert_eq!(commands.len(), 16);

        for pair in commands.chunks(2) {
            let add_id = pair[0].split_whitespace().nth(2).unwrap();
            let set_id = pair[1].split_whitespace().nth(2).unwrap();
            assert!(pair[0].starts_with("widget_add scr "), "got {}", pair[0]);
            assert!(pair[1].starts_with("widget_set scr "), "got {}", pair[1]);
            assert_eq!(add_id, set_id);
        }
        assert_eq!(commands[0], "widget_add scr s string");
        assert_eq!(commands[1], "widget_set scr s 1 1 \"txt\"");
        assert_eq!(commands[10], "widget_add scr sc scroller");
        assert_eq!(commands[11], "widget_set scr sc 1 4 20 4 m 3 \"scroll\"");
        assert_eq!(commands[12], "widget_add scr f frame");
        assert_eq!(commands[13], "widget_set scr f 1 1 20 4 20 8 v 1");
        assert_eq!(commands[14], "widget_add scr n num");
        assert_eq!(commands[15], "widget_set scr n 5 3");
        assert_eq!(session.screen("scr").unwrap().screen().widget_count(), 8);
    }

    #[tokio::test]
    async fn test_duplicate_widget_sends_nothing() {
        let lcdd = MockLcdd::start().await;
        let mut session = session_with_screen(&lcdd).await;
        let mut screen = session.screen("scr").unwrap();

        screen.add_string_widget("eta", 2, 2, "").await.unwrap();
        lcdd.take_commands();

        let err = screen
            .add_icon_widget("eta", 1, 2, "BLOCK_FILLED")
            .await
            .err()
            .unwrap();

        match err {
            LcdError::DuplicateWidget { screen, widget } => {
                assert_eq!(screen, "scr");
                assert_eq!(widget, "eta");
            }
            other => panic!("Expected DuplicateWidget, got: {:?}", other),
        }
        assert!(lcdd.commands().is_empty());
    }

    #[tokio::test]
    async fn test_setters_are_local_until_update() {
        let lcdd = MockLcdd::start().await;
        let mut session = session_with_screen(&lcdd).await;
        let mut screen = session.screen("scr").unwrap();

        screen
            .add_widget(
                "file",
                ScrollerWidget::new(1, 1, 15, 1, "").with_speed(5),
            )
            .await
            .unwrap();
        lcdd.take_commands();

        let mut file = screen.widget::<ScrollerWidget>("file").unwrap();
        file.set_text("benchy.gcode");
        file.set_direction(Direction::Marquee);
        assert!(lcdd.commands().is_empty());

        file.update().await.unwrap();
        assert_eq!(
            lcdd.take_commands(),
            vec!["widget_set scr file 1 1 15 1 m 5 \"benchy.gcode\""]
        );
    }

    #[tokio::test]
    async fn test_widget_kind_mismatch() {
        let lcdd = MockLcdd::start().await;
        let mut session = session_with_screen(&lcdd).await;
        let mut screen = session.screen("scr").unwrap();
        screen.add_string_widget("pct", 18, 1, "").await.unwrap();

        match screen.widget::<IconWidget>("pct").err().unwrap() {
            LcdError::WidgetKindMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "icon");
                assert_eq!(actual, "string");
            }
            other => panic!("Expected WidgetKindMismatch, got: {:?}", other),
        }
        assert!(matches!(
            screen.widget::<StringWidget>("missing").err().unwrap(),
            LcdError::UnknownWidget { .. }
        ));
    }

    #[tokio::test]
    async fn test_priority_and_heartbeat_commands() {
        let lcdd = MockLcdd::start().await;
        let mut session = session_with_screen(&lcdd).await;
        let mut screen = session.screen("scr").unwrap();

        screen.set_heartbeat(Heartbeat::Off).await.unwrap();
        screen.set_priority(Priority::Foreground).await.unwrap();

        assert_eq!(
            lcdd.take_commands(),
            vec![
                "screen_set scr -heartbeat off",
                "screen_set scr -priority foreground",
            ]
        );
        assert_eq!(screen.screen().priority(), Priority::Foreground);
        assert_eq!(screen.screen().heartbeat(), Heartbeat::Off);
    }

    #[tokio::test]
    async fn test_failed_add_does_not_store_widget() {
        let lcdd = MockLcdd::start().await;
        let mut session = session_with_screen(&lcdd).await;
        let mut screen = session.screen("scr").unwrap();

        lcdd.hang_up_next(1);
        assert!(screen.add_string_widget("s", 1, 1, "").await.is_err());

        assert!(screen.screen().widget("s").is_none());
    }
}
