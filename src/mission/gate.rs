//! Gate servo

use embedded_hal_async::delay::DelayNs;

use crate::port::ServoPort;

/// Gate servo moved in one-degree steps between two bounds
pub struct GateActuator<S: ServoPort> {
    servo: S,
    angle: u8,
    min_angle: u8,
    max_angle: u8,
    step_delay_ms: u32,
}

impl<S: ServoPort> GateActuator<S> {
    /// Take the servo and send it home (the upper bound)
    pub fn new(mut servo: S, min_angle: u8, max_angle: u8, step_delay_ms: u32) -> Self {
        servo.set_angle(max_angle);
        Self {
            servo,
            angle: max_angle,
            min_angle,
            max_angle,
            step_delay_ms,
        }
    }

    /// Last commanded angle
    pub fn angle(&self) -> u8 {
        self.angle
    }

    /// Step from `from` to `to`, both inclusive and clamped to the bounds,
    /// waiting the step delay after every write
    pub async fn sweep<D: DelayNs>(&mut self, delay: &mut D, from: u8, to: u8) {
        let from = from.clamp(self.min_angle, self.max_angle);
        let to = to.clamp(self.min_angle, self.max_angle);
        debug!("gate sweep {} -> {}", from, to);

        let mut angle = from;
        loop {
            self.servo.set_angle(angle);
            self.angle = angle;
            delay.delay_ms(self.step_delay_ms).await;
            if angle == to {
                break;
            }
            if angle < to {
                angle += 1;
            } else {
                angle -= 1;
            }
        }
    }
}
