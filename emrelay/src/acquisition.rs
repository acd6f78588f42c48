//! Ping-pong sample acquisition
//!
//! The conversion interrupt fills one side of a two-sided sample store while the
//! decision task reads the other. Each sample tick delivers a Current/Voltage
//! conversion pair; once both windows of the write side hold a full cycle, the sides
//! swap and the consumer is woken. The counter resets at the swap, so it can never
//! index past a window and an overrun of the write side is impossible by construction.
//!
//! The selector and the readiness flag are only ever read and updated together under
//! the mutex. The consumer latches the completed side and clears readiness in one
//! critical section, so the interrupt can neither toggle the selector nor re-raise
//! readiness halfway through the read.
//!
//! If a cycle completes while the previous one is still unconsumed, both sides are
//! full: the task has fallen out of its real-time budget and sample continuity is
//! lost. Rather than overwrite good data, the store latches [`Desync`]; the producer
//! goes quiet and every subsequent consumer call reports the fault.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::waitqueue::WakerRegistration;

use crate::core::{SAMPLES_PER_CYCLE, SampleWindow};
use crate::sample::{AdcChannel, raw_to_volts};

/// Both sides filled before the consumer drained one; acquisition is halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Desync;

/// One completed acquisition cycle, copied out of the store at the handoff.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleData {
    pub current: SampleWindow,
    pub voltage: SampleWindow,
}

struct Side {
    current: SampleWindow,
    voltage: SampleWindow,
}

impl Side {
    const EMPTY: Side = Side {
        current: [0.0; SAMPLES_PER_CYCLE],
        voltage: [0.0; SAMPLES_PER_CYCLE],
    };
}

struct Shared {
    sides: [Side; 2],
    /// Side the producer writes; the other side is readable while `ready` is set.
    write_side: u8,
    /// Completed conversion pairs in the write side, always below `SAMPLES_PER_CYCLE`.
    pair_count: u8,
    next_channel: AdcChannel,
    ready: bool,
    fault: bool,
    waker: WakerRegistration,
}

/// Double-buffered sample store shared by the conversion interrupt and the
/// decision task.
pub struct Acquisition<M: RawMutex> {
    shared: Mutex<M, RefCell<Shared>>,
}

impl<M: RawMutex> Acquisition<M> {
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                sides: [Side::EMPTY, Side::EMPTY],
                write_side: 0,
                pair_count: 0,
                next_channel: AdcChannel::Current,
                ready: false,
                fault: false,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Splits the store into its interrupt-side producer and task-side consumer.
    pub fn split(&mut self) -> (Producer<'_, M>, Consumer<'_, M>) {
        (
            Producer {
                shared: &self.shared,
            },
            Consumer {
                shared: &self.shared,
            },
        )
    }
}

impl<M: RawMutex> Default for Acquisition<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample intake handle. Call from the conversion-complete interrupt.
pub struct Producer<'a, M: RawMutex> {
    shared: &'a Mutex<M, RefCell<Shared>>,
}

impl<'a, M: RawMutex> Producer<'a, M> {
    /// Stores one raw conversion.
    ///
    /// Conversions must alternate Current then Voltage; a conversion arriving for the
    /// wrong channel is discarded so a single glitch cannot shift the pairing for the
    /// rest of the cycle.
    pub fn push(&mut self, channel: AdcChannel, raw: u16) {
        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            if shared.fault {
                return;
            }
            if channel != shared.next_channel {
                warn!("conversion out of order, discarded");
                return;
            }

            let value = raw_to_volts(raw);
            let side = usize::from(shared.write_side);
            let slot = usize::from(shared.pair_count);
            match channel {
                AdcChannel::Current => {
                    shared.sides[side].current[slot] = value;
                    shared.next_channel = AdcChannel::Voltage;
                }
                AdcChannel::Voltage => {
                    shared.sides[side].voltage[slot] = value;
                    shared.next_channel = AdcChannel::Current;
                    shared.pair_count += 1;
                    if usize::from(shared.pair_count) == SAMPLES_PER_CYCLE {
                        shared.pair_count = 0;
                        if shared.ready {
                            // Consumer starved: the other side was never drained.
                            shared.fault = true;
                            error!("both acquisition sides full, halting acquisition");
                        } else {
                            shared.write_side ^= 1;
                            shared.ready = true;
                        }
                        shared.waker.wake();
                    }
                }
            }
        });
    }
}

/// Completed-cycle readout handle for the decision task.
pub struct Consumer<'a, M: RawMutex> {
    shared: &'a Mutex<M, RefCell<Shared>>,
}

impl<'a, M: RawMutex> Consumer<'a, M> {
    /// Waits for the next completed cycle and latches it.
    ///
    /// Latching reads the selector, copies the completed side out and clears the
    /// readiness flag within a single critical section.
    pub async fn next_cycle(&mut self) -> Result<CycleData, Desync> {
        poll_fn(|cx| {
            self.shared.lock(|cell| {
                let mut shared = cell.borrow_mut();
                if shared.fault {
                    return Poll::Ready(Err(Desync));
                }
                if shared.ready {
                    shared.ready = false;
                    Poll::Ready(Ok(Self::read_side(&shared)))
                } else {
                    shared.waker.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }

    /// Non-blocking variant of [`next_cycle`](Self::next_cycle).
    pub fn try_next_cycle(&mut self) -> Result<Option<CycleData>, Desync> {
        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            if shared.fault {
                return Err(Desync);
            }
            if shared.ready {
                shared.ready = false;
                Ok(Some(Self::read_side(&shared)))
            } else {
                Ok(None)
            }
        })
    }

    fn read_side(shared: &Shared) -> CycleData {
        let side = &shared.sides[usize::from(shared.write_side ^ 1)];
        CycleData {
            current: side.current,
            voltage: side.voltage,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use ::core::pin::pin;
    use ::core::task::{Context, Poll};

    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use futures_test::task::new_count_waker;

    use super::*;
    use crate::sample::ADC_FULL_SCALE;

    fn push_pair<M: RawMutex>(producer: &mut Producer<'_, M>, raw_current: u16, raw_voltage: u16) {
        producer.push(AdcChannel::Current, raw_current);
        producer.push(AdcChannel::Voltage, raw_voltage);
    }

    fn push_cycle<M: RawMutex>(producer: &mut Producer<'_, M>, raw: u16) {
        for _ in 0..SAMPLES_PER_CYCLE {
            push_pair(producer, raw, raw);
        }
    }

    #[test]
    fn test_cycle_handoff() {
        let mut acquisition = Acquisition::<NoopRawMutex>::new();
        let (mut producer, mut consumer) = acquisition.split();

        assert_eq!(consumer.try_next_cycle(), Ok(None));

        for slot in 0..SAMPLES_PER_CYCLE {
            // Nothing becomes ready until the full cycle is in.
            assert_eq!(consumer.try_next_cycle(), Ok(None));
            push_pair(&mut producer, slot as u16, ADC_FULL_SCALE - slot as u16);
        }

        let cycle = consumer.try_next_cycle().unwrap().unwrap();
        assert!((cycle.current[1] - raw_to_volts(1)).abs() < 1e-6);
        assert!((cycle.voltage[1] - raw_to_volts(ADC_FULL_SCALE - 1)).abs() < 1e-6);

        // One readiness event per cycle, no residual ready state.
        assert_eq!(consumer.try_next_cycle(), Ok(None));
    }

    #[test]
    fn test_selector_toggles_once_per_cycle() {
        let mut acquisition = Acquisition::<NoopRawMutex>::new();
        let (mut producer, mut consumer) = acquisition.split();

        // First cycle lands in side 0, second in side 1.
        push_cycle(&mut producer, 100);
        let first = consumer.try_next_cycle().unwrap().unwrap();
        push_cycle(&mut producer, 900);
        let second = consumer.try_next_cycle().unwrap().unwrap();

        assert!((first.current[0] - raw_to_volts(100)).abs() < 1e-6);
        assert!((second.current[0] - raw_to_volts(900)).abs() < 1e-6);
    }

    #[test]
    fn test_consumer_woken_once_per_cycle() {
        let mut acquisition = Acquisition::<NoopRawMutex>::new();
        let (mut producer, mut consumer) = acquisition.split();

        let (waker, count) = new_count_waker();
        let cx = &mut Context::from_waker(&waker);

        {
            let mut next = pin!(consumer.next_cycle());
            assert_eq!(next.as_mut().poll(cx), Poll::Pending);

            for slot in 0..SAMPLES_PER_CYCLE {
                push_pair(&mut producer, slot as u16, slot as u16);
                assert_eq!(count.get(), usize::from(slot + 1 == SAMPLES_PER_CYCLE));
            }

            assert!(matches!(next.as_mut().poll(cx), Poll::Ready(Ok(_))));
        }

        // Readiness was cleared by the latch.
        assert_eq!(consumer.try_next_cycle(), Ok(None));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_out_of_order_conversion_discarded() {
        let mut acquisition = Acquisition::<NoopRawMutex>::new();
        let (mut producer, mut consumer) = acquisition.split();

        // Voltage while a Current conversion is expected.
        producer.push(AdcChannel::Voltage, 500);

        push_cycle(&mut producer, 200);
        let cycle = consumer.try_next_cycle().unwrap().unwrap();
        assert!((cycle.voltage[0] - raw_to_volts(200)).abs() < 1e-6);
    }

    #[test]
    fn test_starved_consumer_latches_desync() {
        let mut acquisition = Acquisition::<NoopRawMutex>::new();
        let (mut producer, mut consumer) = acquisition.split();

        push_cycle(&mut producer, 100);
        push_cycle(&mut producer, 200);

        assert_eq!(consumer.try_next_cycle(), Err(Desync));
        assert_eq!(consumer.try_next_cycle(), Err(Desync));

        // The producer stays quiet after the fault.
        push_cycle(&mut producer, 300);
        assert_eq!(consumer.try_next_cycle(), Err(Desync));
    }
}
