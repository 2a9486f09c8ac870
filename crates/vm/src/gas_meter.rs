use tracing::trace;

use crate::errors::VMError;

/// Monotonic gas accounting for a single frame.
#[derive(Debug, Clone)]
pub struct GasMeter {
    start_gas: u64,
    gas_remaining: u64,
    gas_refunded: u64,
}

impl GasMeter {
    pub fn new(start_gas: u64) -> Self {
        Self {
            start_gas,
            gas_remaining: start_gas,
            gas_refunded: 0,
        }
    }

    /// Consumes `amount` gas. On under-run the meter is emptied and the
    /// frame is out of gas.
    pub fn consume(&mut self, amount: u64, reason: &str) -> Result<(), VMError> {
        if amount > self.gas_remaining {
            trace!(amount, remaining = self.gas_remaining, reason, "gas under-run");
            self.gas_remaining = 0;
            return Err(VMError::OutOfGas);
        }
        self.gas_remaining -= amount;
        trace!(amount, remaining = self.gas_remaining, reason, "gas consumed");
        Ok(())
    }

    /// Books a refund; refunds never restore `gas_remaining` directly and
    /// are settled at the end of the transaction.
    pub fn refund(&mut self, amount: u64) {
        self.gas_refunded += amount;
        trace!(amount, total = self.gas_refunded, "gas refunded");
    }

    /// Returns unused gas from a finished child frame.
    pub fn return_gas(&mut self, amount: u64) {
        self.gas_remaining = self.gas_remaining.saturating_add(amount);
        trace!(amount, remaining = self.gas_remaining, "gas returned");
    }

    pub fn start_gas(&self) -> u64 {
        self.start_gas
    }

    pub fn gas_remaining(&self) -> u64 {
        self.gas_remaining
    }

    pub fn gas_refunded(&self) -> u64 {
        self.gas_refunded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_subtracts() {
        let mut meter = GasMeter::new(100);
        meter.consume(40, "test").unwrap();
        assert_eq!(meter.gas_remaining(), 60);
    }

    #[test]
    fn under_run_empties_the_meter() {
        let mut meter = GasMeter::new(100);
        assert_eq!(meter.consume(101, "test"), Err(VMError::OutOfGas));
        assert_eq!(meter.gas_remaining(), 0);
    }

    #[test]
    fn refund_does_not_restore_remaining() {
        let mut meter = GasMeter::new(100);
        meter.consume(50, "test").unwrap();
        meter.refund(15_000);
        assert_eq!(meter.gas_remaining(), 50);
        assert_eq!(meter.gas_refunded(), 15_000);
    }

    #[test]
    fn return_gas_restores_remaining() {
        let mut meter = GasMeter::new(100);
        meter.consume(80, "test").unwrap();
        meter.return_gas(30);
        assert_eq!(meter.gas_remaining(), 50);
    }
}
