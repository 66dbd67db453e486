//! Protocol schema: requests, responses, and result codes.
//!
//! Every request kind carries only the payload it needs. The integer values of
//! [`MessageType`], [`ResponseType`] and [`ResultCode`] are part of the wire
//! contract and must not change.

use serde::{Deserialize, Serialize};

use crate::{DataPacket, PosePacket, TrackerBase, TrackerRole};

/// Protocol schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[default]
    V1,
}

/// Current time in microseconds since the Unix epoch
pub fn timestamp_now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// Integer message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageType {
    Invalid = 0,
    AddTracker = 1,
    SetTrackerState = 2,
    SetStateAll = 3,
    UpdateTrackerPose = 4,
    UpdateTrackerData = 5,
    UpdateTrackerVector = 6,
    DownloadTracker = 7,
    RefreshTracker = 8,
    RequestRestart = 9,
    Ping = 10,
}

impl MessageType {
    /// Label used for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::AddTracker => "add_tracker",
            Self::SetTrackerState => "set_tracker_state",
            Self::SetStateAll => "set_state_all",
            Self::UpdateTrackerPose => "update_tracker_pose",
            Self::UpdateTrackerData => "update_tracker_data",
            Self::UpdateTrackerVector => "update_tracker_vector",
            Self::DownloadTracker => "download_tracker",
            Self::RefreshTracker => "refresh_tracker",
            Self::RequestRestart => "request_restart",
            Self::Ping => "ping",
        }
    }
}

/// Lookup key for a download request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadQuery {
    Id(i32),
    Serial(String),
    /// First tracker registered with this role
    Role(TrackerRole),
}

/// Request payload, one variant per message kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    AddTracker {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tracker: Option<TrackerBase>,
    },
    SetTrackerState {
        id: i32,
        state: bool,
    },
    SetStateAll {
        state: bool,
    },
    UpdateTrackerPose {
        id: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pose: Option<PosePacket>,
    },
    UpdateTrackerData {
        id: i32,
        data: DataPacket,
    },
    UpdateTrackerVector {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trackers: Option<Vec<TrackerBase>>,
    },
    DownloadTracker {
        query: DownloadQuery,
    },
    RefreshTracker {
        id: i32,
    },
    RequestRestart {
        #[serde(default)]
        reason: String,
    },
    Ping,
}

impl Request {
    /// Integer kind of this request
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::AddTracker { .. } => MessageType::AddTracker,
            Self::SetTrackerState { .. } => MessageType::SetTrackerState,
            Self::SetStateAll { .. } => MessageType::SetStateAll,
            Self::UpdateTrackerPose { .. } => MessageType::UpdateTrackerPose,
            Self::UpdateTrackerData { .. } => MessageType::UpdateTrackerData,
            Self::UpdateTrackerVector { .. } => MessageType::UpdateTrackerVector,
            Self::DownloadTracker { .. } => MessageType::DownloadTracker,
            Self::RefreshTracker { .. } => MessageType::RefreshTracker,
            Self::RequestRestart { .. } => MessageType::RequestRestart,
            Self::Ping => MessageType::Ping,
        }
    }
}

/// Request envelope written to the request channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    #[serde(default)]
    pub version: ProtocolVersion,
    /// Time the client composed the message
    #[serde(default)]
    pub timestamp_us: i64,
    /// Free slot for intermediate timing events
    #[serde(default)]
    pub manual_timestamp_us: i64,
    #[serde(default = "default_want_reply")]
    pub want_reply: bool,
    pub request: Request,
}

fn default_want_reply() -> bool {
    true
}

impl RequestMessage {
    /// Envelope that asks for a reply, timestamps unset
    pub fn new(request: Request) -> Self {
        Self {
            version: ProtocolVersion::V1,
            timestamp_us: 0,
            manual_timestamp_us: 0,
            want_reply: true,
            request,
        }
    }

    pub fn with_reply(mut self, want_reply: bool) -> Self {
        self.want_reply = want_reply;
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.request.message_type()
    }
}

/// Kind of payload a response carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    Invalid = 0,
    Id = 1,
    Success = 2,
    Tracker = 3,
}

/// Result taxonomy carried as an integer on every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum ResultCode {
    Exception = -10,
    UnknownError = -1,
    Invalid = 0,
    Ok = 1,
    SpawnFailed = 2,
    AlreadyPresent = 3,
    BadRequest = 4,
    ParsingError = 5,
    BadSerial = 6,
}

impl ResultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exception => "exception",
            Self::UnknownError => "unknown_error",
            Self::Invalid => "invalid",
            Self::Ok => "ok",
            Self::SpawnFailed => "spawn_failed",
            Self::AlreadyPresent => "already_present",
            Self::BadRequest => "bad_request",
            Self::ParsingError => "parsing_error",
            Self::BadSerial => "bad_serial",
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code as i32
    }
}

impl TryFrom<i32> for ResultCode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -10 => Ok(Self::Exception),
            -1 => Ok(Self::UnknownError),
            0 => Ok(Self::Invalid),
            1 => Ok(Self::Ok),
            2 => Ok(Self::SpawnFailed),
            3 => Ok(Self::AlreadyPresent),
            4 => Ok(Self::BadRequest),
            5 => Ok(Self::ParsingError),
            6 => Ok(Self::BadSerial),
            other => Err(format!("unknown result code: {other}")),
        }
    }
}

/// Response envelope written to the reply channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub version: ProtocolVersion,
    #[serde(default)]
    pub response_type: ResponseType,
    /// Tracker id the response refers to, -1 if none
    #[serde(default = "unassigned_id")]
    pub id: i32,
    #[serde(default = "unknown_result")]
    pub result: ResultCode,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker: Option<TrackerBase>,
    /// Time the server sent the response
    #[serde(default)]
    pub timestamp_us: i64,
    /// Time the server started parsing the request
    #[serde(default)]
    pub manual_timestamp_us: i64,
}

fn unassigned_id() -> i32 {
    -1
}

fn unknown_result() -> ResultCode {
    ResultCode::UnknownError
}

impl Default for ResponseMessage {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::V1,
            response_type: ResponseType::Invalid,
            id: unassigned_id(),
            result: unknown_result(),
            success: false,
            tracker: None,
            timestamp_us: 0,
            manual_timestamp_us: 0,
        }
    }
}

impl ResponseMessage {
    /// Failed response with the given code
    pub fn failure(result: ResultCode) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    /// Successful response of the given kind
    pub fn success(response_type: ResponseType) -> Self {
        Self {
            response_type,
            result: ResultCode::Ok,
            success: true,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    pub fn with_tracker(mut self, tracker: TrackerBase) -> Self {
        self.tracker = Some(tracker);
        self
    }
}
