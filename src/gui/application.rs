use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::time::{every as iced_time_every};
use iced::theme::Theme;
use iced::widget::{
    Column, PickList, button, column, container, horizontal_rule, row, scrollable, text, text_input,
};
use std::time::{Duration};
use log::{error, info, warn};
use tokio_util::sync::{CancellationToken};

use crate::cli::Cli;
use crate::config::io::{ConfigIO};
use crate::config::types::{Config, ValueEncoding};
use crate::device::connection::{disconnect, read_value, scan_and_connect};
use crate::device::scan::continuous_scan_subscription;
use crate::device::types::ConnectedDevice;
use crate::error::AppRunError;
use crate::gui::executor::MyExecutor;
use crate::gui::state::ScreenState;
use crate::gui::types::Message;
use crate::os::permissions::request_permissions;

pub struct ApplicationFlags {
    config_io: ConfigIO,
    cli: Cli,
}

pub struct MyApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    // current config, might not be saved to disk yet
    config_io: ConfigIO,
    config: Config,
    config_dirty: bool,
    // this flag is used to make sure that a user is not spammed with save configuration errors
    displayed_config_save_error: bool,
    cli: Cli,

    screen: ScreenState,
}

impl MyApplication {
    fn request_permissions(&self) -> Command<Message> {
        Command::perform(request_permissions(), Message::PermissionsChecked)
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    let mut error_message: Option<String> = None;

                    if err.is_file_not_found_error() {
                        info!("Config file not found, using defaults");
                    } else {
                        error!("Failed to load config: {:?}", &err);
                        error_message = Some(format!("Failed to load config: {}", &err));
                    }
                    (Config::default(), error_message)
                }
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn save_config(&self) -> Command<Message> {
        let config = self.config.clone();
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.save(config).await {
                Ok(_) => None,
                Err(err) => {
                    error!("Failed to save config: {:?}", &err);
                    Some(format!("Failed to save config: {}", &err))
                },
            }
        };

        Command::perform(fut, Message::ConfigSaveComplete)
    }

    fn scan_and_connect(&mut self) -> Command<Message> {
        let config = self.screen.begin_scan_and_connect(&self.config);
        let cancel = self.app_cancel.clone();

        let fut = async move {
            match scan_and_connect(cancel, config.clone()).await {
                Ok(device) => device.map(|device| (device, config)),
                Err(err) => {
                    // connection failures are not shown in the window
                    error!("Connection error: {}", err);
                    None
                },
            }
        };

        Command::perform(fut, Message::ConnectComplete)
    }

    fn read_data(&self, device: ConnectedDevice, config: Config) -> Command<Message> {
        let fut = async move {
            match read_value(&device, &config).await {
                Ok(value) => value,
                Err(err) => {
                    error!("Read error: {}", err);
                    None
                },
            }
        };

        Command::perform(fut, Message::ReadComplete)
    }

    fn disconnect_device(&self, device: ConnectedDevice) -> Command<Message> {
        Command::perform(disconnect(device), Message::DisconnectComplete)
    }

    fn before_close(&mut self, id: window::Id) -> Command<Message> {
        self.app_cancel.cancel();

        match self.screen.take_connected() {
            Some(device) => Command::perform(disconnect(device), move |_| Message::TeardownComplete(id)),
            None => window::close(id),
        }
    }
}

impl Application for MyApplication {
    type Executor = MyExecutor;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (MyApplication, Command<Self::Message>) {
        let app = MyApplication {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            config: Config::default(),
            config_dirty: false,
            displayed_config_save_error: false,
            cli: flags.cli,
            screen: ScreenState::default(),
        };

        let command = Command::batch(vec![
            app.request_permissions(),
            app.load_config(),
        ]);
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("BLE Explorer ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::PermissionsChecked(report) => {
                self.screen.set_bluetooth_denied(report.any_denied());
            },
            Message::ConfigLoadComplete((mut config, error_message)) => {
                info!("Config load complete");
                config.apply_overrides(&self.cli);
                self.config = config;
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }
            },
            Message::ApplyDirtyConfig => {
                if self.config_dirty {
                    self.config_dirty = false;
                    return self.save_config();
                }
            },
            Message::ConfigSaveComplete(error_message) => {
                if !self.displayed_config_save_error {
                    if let Some(error_message) = error_message {
                        self.displayed_config_save_error = true;
                        self.notices.push(error_message);
                    }
                }
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                return self.before_close(id);
            },
            Message::TeardownComplete(id) => {
                return window::close(id);
            },
            Message::DeviceEvent(event) => {
                self.screen.apply_device_event(event);
            },
            Message::ScanAndConnect => {
                return self.scan_and_connect();
            },
            Message::ConnectComplete(connected) => {
                let Some((device, config)) = connected else {
                    self.screen.connect_complete(None);
                    return Command::none();
                };

                if self.app_cancel.is_cancelled() {
                    warn!("Connected while closing, disconnecting again");
                    self.screen.connect_complete(None);
                    return self.disconnect_device(device);
                }

                info!("Connected to {}", device.name);
                let read = self.read_data(device.clone(), config);
                let mut commands = vec![read];
                if let Some(previous) = self.screen.connect_complete(Some(device)) {
                    commands.push(self.disconnect_device(previous));
                }
                return Command::batch(commands);
            },
            Message::ReadComplete(value) => {
                self.screen.read_complete(value);
            },
            Message::DeviceNameChange(device_name) => {
                self.config.device_name = device_name;
                self.config_dirty = true;
            },
            Message::EncodingChange(encoding) => {
                self.config.encoding = encoding;
                self.config_dirty = true;
            },

            _ => {}
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen().map(Message::EventOccurred),
            iced_time_every(Duration::from_secs(1)).map(|_| Message::ApplyDirtyConfig),
            continuous_scan_subscription(self.app_cancel.clone()).map(Message::DeviceEvent),
        ])
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let target_form = row![
            text("Device"),
            text_input("Device name", self.config.device_name.as_str())
                .width(200)
                .on_input(Message::DeviceNameChange),
            PickList::new(
                ValueEncoding::ALL,
                Some(self.config.encoding),
                Message::EncodingChange,
            ).width(100),
        ]
        .align_items(Alignment::Center)
        .spacing(10);

        let mut status = Column::new().spacing(5);

        for line in self.screen.status_lines() {
            status = status.push(text(line));
        }

        let mut footer = Column::new().spacing(5);

        if self.screen.bluetooth_denied() {
            footer = footer.push(text("Not allowed to access Bluetooth!"));
        }
        footer = footer.push(target_form);
        if self.screen.is_connecting() {
            footer = footer.push(text(format!("Looking for {}…", self.config.device_name)));
        }

        let mut lists = Column::new()
            .push(text("Scanned Devices:"))
            .spacing(5)
            .width(Length::Fill);

        for name in self.screen.device_names() {
            lists = lists.push(text(name));
        }
        for error in self.screen.errors() {
            lists = lists.push(text(error));
        }

        container(
            column![
                button(text("Scan & Connect"))
                    .on_press(Message::ScanAndConnect),
                status,
                scrollable(lists).height(Length::Fill),
                horizontal_rule(10),
                footer,
            ]
            .spacing(20)
            .width(Length::Fill),
        )
        .width(Length::Fill)
        .padding(20)
        .into()
    }
}

pub fn run_application(cli: Cli) -> Result<(), AppRunError> {
    let mut config_io = ConfigIO::new_sync(cli.config.clone())?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags { config_io, cli };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("ble-explorer".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(500.0, 700.0);

    // this function will call process::exit() unless there was a startup error
    MyApplication::run(settings)?;
    Ok(())
}
