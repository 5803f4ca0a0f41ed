//! The print status screen: widget placement and field updates

use printlcd_config::DisplayConfig;
use tracing::debug;

use super::state::StatusView;
use crate::lcdproc::{
    Direction, Heartbeat, LcdError, ScrollerWidget, ServerInfo, Session, StringWidget,
};

pub const SCREEN_ID: &str = "PrintStatus";

const TITLE: &str = "Title";
const FILENAME: &str = "TextFileName";
const PERCENT: &str = "TextPercent";
const ICON_ETA: &str = "IconETA";
const ETA: &str = "TextETA";
const ICON_FINISH: &str = "IconFIN";
const FINISH: &str = "TextFIN";

const FILENAME_SCROLL_SPEED: u16 = 5;

/// Which parts of the screen an update touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub priority: bool,
    pub filename: bool,
    pub percent: bool,
    /// ETA and finish time
    pub times: bool,
}

impl Fields {
    pub const ALL: Self = Self {
        priority: true,
        filename: true,
        percent: true,
        times: true,
    };
    pub const PRIORITY: Self = Self {
        priority: true,
        filename: false,
        percent: false,
        times: false,
    };
    pub const PERCENT: Self = Self {
        priority: false,
        filename: false,
        percent: true,
        times: false,
    };
    pub const PROGRESS: Self = Self {
        priority: false,
        filename: false,
        percent: true,
        times: true,
    };
}

/// Placement of the status widgets on a display of known size
///
/// ```text
/// [title.............]   only with title_show on 3+ rows
/// [filename.......][%]
/// >[eta]     [finish]<
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    width: u16,
    show_title: bool,
}

impl Layout {
    pub fn new(info: &ServerInfo, settings: &DisplayConfig) -> Self {
        Self {
            width: info.width.max(1),
            show_title: settings.title_show && info.height >= 3,
        }
    }

    pub fn shows_title(&self) -> bool {
        self.show_title
    }

    /// Row of the filename and percent
    pub fn file_row(&self) -> u16 {
        if self.show_title {
            2
        } else {
            1
        }
    }

    /// Row of the ETA and finish time
    pub fn time_row(&self) -> u16 {
        self.file_row() + 1
    }

    /// Last column of the filename scroller, leaving room for `100%`
    pub fn filename_right(&self) -> u16 {
        self.width.saturating_sub(5).max(1)
    }

    /// Column that right-aligns the percent text against the last column
    pub fn percent_x(&self, text: &str) -> u16 {
        self.width.saturating_add(1).saturating_sub(text_len(text)).max(1)
    }

    /// Column that right-aligns the finish text against the finish icon
    pub fn finish_x(&self, text: &str) -> u16 {
        self.width.saturating_sub(text_len(text)).max(1)
    }

    /// Register the status screen and all of its widgets on a fresh session
    ///
    /// The priority is set before any widget exists, so a screen that should
    /// be hidden never flashes up with empty widgets.
    pub async fn build(
        &self,
        session: &mut Session,
        settings: &DisplayConfig,
        view: &StatusView,
    ) -> Result<(), LcdError> {
        let mut screen = session.add_screen(SCREEN_ID).await?;
        screen.set_heartbeat(Heartbeat::Off).await?;
        screen.set_priority(view.priority).await?;

        if self.show_title {
            screen.add_title_widget(TITLE, &settings.title_text).await?;
        }

        let row = self.file_row();
        screen
            .add_scroller_widget(
                FILENAME,
                1,
                row,
                self.filename_right(),
                row,
                Direction::Horizontal,
                FILENAME_SCROLL_SPEED,
                &view.filename,
            )
            .await?;
        screen
            .add_string_widget(PERCENT, self.percent_x(&view.percent), row, &view.percent)
            .await?;

        let row = self.time_row();
        screen
            .add_icon_widget(ICON_ETA, 1, row, "SELECTOR_AT_RIGHT")
            .await?;
        screen.add_string_widget(ETA, 2, row, &view.eta).await?;
        screen
            .add_icon_widget(ICON_FINISH, self.width, row, "SELECTOR_AT_LEFT")
            .await?;
        screen
            .add_string_widget(FINISH, self.finish_x(&view.finish), row, &view.finish)
            .await?;

        debug!(
            width = self.width,
            title = self.show_title,
            widgets = screen.screen().widget_count(),
            "Status screen built"
        );
        Ok(())
    }

    /// Push the selected parts of `view` to an already built screen
    ///
    /// The priority always goes out first.
    pub async fn apply(
        &self,
        session: &mut Session,
        fields: Fields,
        view: &StatusView,
    ) -> Result<(), LcdError> {
        let mut screen = session.screen(SCREEN_ID)?;

        if fields.priority {
            screen.set_priority(view.priority).await?;
        }

        if fields.filename {
            let mut filename = screen.widget::<ScrollerWidget>(FILENAME)?;
            filename.set_text(view.filename.as_str());
            filename.update().await?;
        }

        if fields.percent {
            let mut percent = screen.widget::<StringWidget>(PERCENT)?;
            percent.set_x(self.percent_x(&view.percent));
            percent.set_text(view.percent.as_str());
            percent.update().await?;
        }

        if fields.times {
            let mut eta = screen.widget::<StringWidget>(ETA)?;
            eta.set_text(view.eta.as_str());
            eta.update().await?;

            let mut finish = screen.widget::<StringWidget>(FINISH)?;
            finish.set_x(self.finish_x(&view.finish));
            finish.set_text(view.finish.as_str());
            finish.update().await?;
        }

        Ok(())
    }
}

fn text_len(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}
