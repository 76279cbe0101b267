use uuid::{uuid, Uuid};

/**
 * How often (milliseconds) scan-and-connect looks through the discovered peripherals.
 */
pub const POLL_DELAY: u64 = 250;

/**
 * How long (milliseconds) disconnecting from the peripheral may take while closing.
 */
pub const DISCONNECT_DEADLINE: u64 = 2000;

/**
 * Advertised name of the peripheral that scan-and-connect looks for, unless configured otherwise.
 */
pub const DEFAULT_DEVICE_NAME: &str = "MyBLEDevice";

/**
 * The UUID of the service that holds the characteristic to read.
 */
pub const DEFAULT_SERVICE_UUID: Uuid = uuid!("12345678-1234-1234-1234-123456789abc");

/**
 * The UUID of the characteristic to read.
 */
pub const DEFAULT_CHARACTERISTIC_UUID: Uuid = uuid!("abcdefab-1234-1234-1234-abcdefabcdef");
