use bytes::Bytes;
use ethereum_types::U256;
use ethrun_common::{
    types::{TxKind, create_contract_address},
    utils::{address_to_word, word_to_address},
};

use crate::{
    computation::{Computation, u256_to_usize},
    constants::{
        GAS_CALL_STIPEND, GAS_CALL_VALUE, GAS_NEW_ACCOUNT, REVERT_FOR_CALL, STACK_DEPTH_LIMIT,
        SUCCESS_FOR_CALL,
    },
    errors::VMError,
    gas_cost::all_but_one_64th,
    message::Message,
    opcodes::OpcodeResult,
    vm::Vm,
};

pub fn stop(_vm: &mut Vm<'_>, _computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    Ok(OpcodeResult::Halt)
}

pub fn return_op(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    computation.extend_memory(offset, size)?;
    let output = computation.memory_read(offset, size)?;
    computation.set_output(output);
    Ok(OpcodeResult::Halt)
}

pub fn selfdestruct(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    if computation.msg.is_static {
        return Err(VMError::WriteProtection);
    }
    let beneficiary = word_to_address(computation.stack.pop()?);
    let new_account_cost = vm.rules.selfdestruct_new_account_gas;
    if new_account_cost > 0 && !vm.state.account_exists(beneficiary)? {
        computation
            .gas_meter
            .consume(new_account_cost, "SELFDESTRUCT to new account")?;
    }
    // The balance moves to the beneficiary when deletions settle at the end
    // of the transaction; until then the account stays callable.
    computation.register_account_for_deletion(beneficiary)?;
    Ok(OpcodeResult::Halt)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallVariant {
    Call,
    CallCode,
    DelegateCall,
}

pub fn call(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    call_family(vm, computation, CallVariant::Call)
}

pub fn callcode(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    call_family(vm, computation, CallVariant::CallCode)
}

pub fn delegatecall(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    call_family(vm, computation, CallVariant::DelegateCall)
}

fn call_family(
    vm: &mut Vm<'_>,
    computation: &mut Computation,
    variant: CallVariant,
) -> Result<OpcodeResult, VMError> {
    let gas = computation.stack.pop()?;
    let code_address = word_to_address(computation.stack.pop()?);
    let storage_address = computation.msg.storage_address();
    let (to, sender, value, should_transfer_value) = match variant {
        CallVariant::Call => (code_address, storage_address, computation.stack.pop()?, true),
        CallVariant::CallCode => (
            storage_address,
            storage_address,
            computation.stack.pop()?,
            true,
        ),
        CallVariant::DelegateCall => (
            storage_address,
            computation.msg.sender,
            computation.msg.value,
            false,
        ),
    };
    if computation.msg.is_static && should_transfer_value && !value.is_zero() {
        return Err(VMError::WriteProtection);
    }
    let in_offset = computation.stack.pop()?;
    let in_size = computation.stack.pop()?;
    let out_offset = computation.stack.pop()?;
    let out_size = computation.stack.pop()?;

    computation.extend_memory(in_offset, in_size)?;
    computation.extend_memory(out_offset, out_size)?;
    let call_data = computation.memory_read(in_offset, in_size)?;

    // Surcharges the caller pays on top of the gas it forwards.
    let mut extra_gas = 0;
    if variant == CallVariant::Call && !vm.state.account_exists(to)? {
        extra_gas += GAS_NEW_ACCOUNT;
    }
    let has_value = !value.is_zero() && variant != CallVariant::DelegateCall;
    if has_value {
        extra_gas += GAS_CALL_VALUE;
    }
    let stipend = if has_value { GAS_CALL_STIPEND } else { 0 };

    let requested = u64::try_from(gas).unwrap_or(u64::MAX);
    let child_gas = if vm.rules.call_gas_cap {
        // EIP-150: forward at most all but one 64th of what is left after
        // the surcharges.
        let remaining = computation.gas_meter.gas_remaining();
        if extra_gas > remaining {
            computation.gas_meter.consume(extra_gas, "call surcharges")?;
            return Err(VMError::OutOfGas);
        }
        requested.min(all_but_one_64th(remaining - extra_gas))
    } else {
        requested
    };
    let total_fee = child_gas
        .checked_add(extra_gas)
        .ok_or(VMError::OutOfGas)?;
    computation.gas_meter.consume(total_fee, "call gas and surcharges")?;
    let child_msg_gas = child_gas + stipend;

    let sender_balance = vm.state.get_balance(storage_address)?;
    let insufficient_funds = should_transfer_value && sender_balance < value;
    let stack_too_deep = computation.msg.depth + 1 >= STACK_DEPTH_LIMIT;
    if insufficient_funds || stack_too_deep {
        computation.gas_meter.return_gas(child_msg_gas);
        computation.stack.push(U256::from(REVERT_FOR_CALL))?;
        return Ok(OpcodeResult::Continue);
    }

    let code = vm.state.get_code(code_address)?;
    let child_msg = Message {
        gas: child_msg_gas,
        gas_price: computation.msg.gas_price,
        to: TxKind::Call(to),
        sender,
        origin: computation.msg.origin,
        value,
        data: call_data,
        code,
        depth: computation.msg.depth + 1,
        code_address: Some(code_address),
        create_address: None,
        is_static: computation.msg.is_static,
        should_transfer_value,
    };
    let outcome = vm.apply_child_computation(computation, child_msg)?;

    if outcome.success {
        computation.stack.push(U256::from(SUCCESS_FOR_CALL))?;
    } else {
        computation.stack.push(U256::from(REVERT_FOR_CALL))?;
    }
    if !outcome.erases_return_data && !out_size.is_zero() {
        let limit = u256_to_usize(out_size)?.min(outcome.output.len());
        computation
            .memory
            .write(u256_to_usize(out_offset)?, &outcome.output[..limit]);
    }
    if !outcome.should_burn_gas {
        computation.gas_meter.return_gas(outcome.gas_remaining);
    }
    Ok(OpcodeResult::Continue)
}

pub fn create(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    if computation.msg.is_static {
        return Err(VMError::WriteProtection);
    }
    let value = computation.stack.pop()?;
    let offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    computation.extend_memory(offset, size)?;

    let storage_address = computation.msg.storage_address();
    let insufficient_funds = vm.state.get_balance(storage_address)? < value;
    let stack_too_deep = computation.msg.depth + 1 >= STACK_DEPTH_LIMIT;
    if insufficient_funds || stack_too_deep {
        computation.stack.push(U256::zero())?;
        return Ok(OpcodeResult::Continue);
    }

    let init_code = computation.memory_read(offset, size)?;
    let child_gas = if vm.rules.call_gas_cap {
        all_but_one_64th(computation.gas_meter.gas_remaining())
    } else {
        computation.gas_meter.gas_remaining()
    };
    computation.gas_meter.consume(child_gas, "CREATE")?;

    // The address derives from the creator's nonce before the create frame
    // increments it.
    let creation_nonce = vm.state.get_nonce(storage_address)?;
    let contract_address = create_contract_address(storage_address, creation_nonce);

    let child_msg = Message {
        gas: child_gas,
        gas_price: computation.msg.gas_price,
        to: TxKind::Create,
        sender: storage_address,
        origin: computation.msg.origin,
        value,
        data: Bytes::new(),
        code: init_code,
        depth: computation.msg.depth + 1,
        code_address: None,
        create_address: Some(contract_address),
        is_static: computation.msg.is_static,
        should_transfer_value: true,
    };
    let outcome = vm.apply_child_computation(computation, child_msg)?;

    if outcome.success {
        computation.stack.push(address_to_word(contract_address))?;
    } else {
        computation.stack.push(U256::zero())?;
    }
    if !outcome.should_burn_gas {
        computation.gas_meter.return_gas(outcome.gas_remaining);
    }
    Ok(OpcodeResult::Continue)
}
