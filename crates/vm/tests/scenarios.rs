//! End-to-end transaction scenarios over the full pipeline: validation,
//! fee pre-charge, execution, refunds and self-destruct settlement.

use bytes::Bytes;
use ethereum_types::{Address, U256};
use ethrun_common::{
    constants::EMPTY_TRIE_ROOT,
    types::{Fork, SECP256K1_ORDER, Transaction, TxKind, create_contract_address},
    utils::address_to_word,
};
use ethrun_vm::{
    InvalidTransaction,
    operations::{Operation, ops_to_bytecode},
    utils::{TestVm, address_of, test_secret_key},
};

fn push1(value: u64) -> Operation {
    Operation::Push((1, U256::from(value)))
}

fn push_address(address: Address) -> Operation {
    Operation::Push((20, address_to_word(address)))
}

fn signed_transfer(
    seed: u8,
    nonce: u64,
    to: TxKind,
    value: U256,
    gas: u64,
    data: Bytes,
) -> Transaction {
    Transaction::new_unsigned(nonce, U256::one(), gas, to, value, data)
        .sign(&test_secret_key(seed))
}

#[test]
fn simple_value_transfer_frontier() {
    let key = test_secret_key(1);
    let sender = address_of(&key);
    let recipient = Address::repeat_byte(0xbb);
    let initial = U256::from(10).pow(18.into());

    let mut vm = TestVm::new();
    vm.fund(sender, initial).unwrap();

    let value = U256::from(10).pow(17.into());
    let tx = signed_transfer(1, 0, TxKind::Call(recipient), value, 21_000, Bytes::new());
    let (receipt, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();

    assert!(report.is_success());
    assert_eq!(report.gas_used, 21_000);
    assert_eq!(report.gas_refunded, 0);
    assert!(report.logs.is_empty());
    assert_eq!(
        vm.state.get_balance(sender).unwrap(),
        initial - value - 21_000
    );
    assert_eq!(vm.state.get_nonce(sender).unwrap(), 1);
    assert_eq!(vm.state.get_balance(recipient).unwrap(), value);
    assert_eq!(
        vm.state.get_balance(vm.block.coinbase).unwrap(),
        U256::from(21_000)
    );
    assert_eq!(receipt.cumulative_gas_used, 21_000);
    assert_eq!(receipt.state_root, vm.state.state_root());
    assert!(receipt.logs.is_empty());
}

#[test]
fn contract_creation_then_call_homestead() {
    let key = test_secret_key(2);
    let sender = address_of(&key);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(10).pow(18.into())).unwrap();

    // Init code returning the runtime `6005600055` (slot 0 <- 5, then
    // fall-through halt). PUSH5 puts it in the low bytes of the word, so
    // the runtime lives at offset 27.
    let init_code = ops_to_bytecode(&[
        Operation::Push((5, U256::from(0x6005600055u64))),
        push1(0),
        Operation::Mstore,
        push1(5),
        push1(27),
        Operation::Return,
    ]);

    let deploy = signed_transfer(2, 0, TxKind::Create, U256::zero(), 100_000, init_code);
    let (_, report) = vm.execute_transaction(&deploy, Fork::Homestead).unwrap();
    assert!(report.is_success());

    let expected_address = create_contract_address(sender, 0);
    assert_eq!(report.created_address, Some(expected_address));
    assert_eq!(
        vm.state.get_code(expected_address).unwrap().as_ref(),
        &[0x60, 0x05, 0x60, 0x00, 0x55]
    );
    // Deposit cost for 5 bytes of runtime is 1000 on top of execution.
    assert!(report.gas_used > 21_000 + 32_000 + 1_000);

    // Calling the contract runs the runtime, which stores 5 at slot 0.
    let call = signed_transfer(
        2,
        1,
        TxKind::Call(expected_address),
        U256::zero(),
        100_000,
        Bytes::new(),
    );
    let (_, call_report) = vm.execute_transaction(&call, Fork::Homestead).unwrap();
    assert!(call_report.is_success());
    assert_eq!(
        vm.state.get_storage(expected_address, U256::zero()).unwrap(),
        U256::from(5)
    );

    // A further call leaves the slot unchanged.
    let again = signed_transfer(
        2,
        2,
        TxKind::Call(expected_address),
        U256::zero(),
        100_000,
        Bytes::new(),
    );
    vm.execute_transaction(&again, Fork::Homestead).unwrap();
    assert_eq!(
        vm.state.get_storage(expected_address, U256::zero()).unwrap(),
        U256::from(5)
    );
}

#[test]
fn sstore_clear_refund_is_capped_at_half_the_gas_used() {
    let key = test_secret_key(3);
    let sender = address_of(&key);
    let contract = Address::repeat_byte(0xcc);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(10).pow(18.into())).unwrap();
    // Contract clears slot 0, which holds 7 beforehand.
    vm.install_contract(
        contract,
        &ops_to_bytecode(&[push1(0), push1(0), Operation::Sstore, Operation::Stop]),
    )
    .unwrap();
    vm.state
        .set_storage(contract, U256::zero(), U256::from(7))
        .unwrap();

    let tx = signed_transfer(
        3,
        0,
        TxKind::Call(contract),
        U256::zero(),
        100_000,
        Bytes::new(),
    );
    let (_, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();
    assert!(report.is_success());

    // Execution used 21000 intrinsic + 2 pushes + 5000 for the clear; the
    // 15000 refund is capped at half of that.
    let gross = 21_000 + 3 + 3 + 5_000;
    assert_eq!(report.gas_refunded, gross / 2);
    assert_eq!(report.gas_used, gross - gross / 2);
    // Slot is deleted, not zero-valued.
    assert_eq!(
        vm.state.get_account(contract).unwrap().storage_root,
        *EMPTY_TRIE_ROOT
    );
}

#[test]
fn recursive_calls_hit_the_depth_limit_and_unwind_successfully() {
    // 1024 nested frames recurse through the interpreter natively; give the
    // test a stack deep enough to hold them.
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(recursive_depth_limit_body)
        .unwrap()
        .join()
        .unwrap();
}

fn recursive_depth_limit_body() {
    let key = test_secret_key(4);
    let sender = address_of(&key);
    let contract = Address::repeat_byte(0xdd);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(10).pow(18.into())).unwrap();
    // The contract calls itself forwarding all but 2000 gas.
    vm.install_contract(
        contract,
        &ops_to_bytecode(&[
            push1(0), // out size
            push1(0), // out offset
            push1(0), // in size
            push1(0), // in offset
            push1(0), // value
            push_address(contract),
            Operation::Gas,
            Operation::Push((2, U256::from(2_000))),
            Operation::Swap(1),
            Operation::Sub,
            Operation::Call,
            Operation::Stop,
        ]),
    )
    .unwrap();

    let tx = signed_transfer(
        4,
        0,
        TxKind::Call(contract),
        U256::zero(),
        8_000_000,
        Bytes::new(),
    );
    vm.block.gas_limit = 8_000_000;
    let (_, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();

    // The 1025th frame is refused, every frame above unwinds cleanly and
    // the transaction succeeds without burning its gas.
    assert!(report.is_success());
    assert!(report.gas_used < 8_000_000);
    assert!(report.gas_used > 21_000);
}

#[test]
fn selfdestruct_settles_at_end_of_transaction() {
    let key = test_secret_key(5);
    let sender = address_of(&key);
    let contract = Address::repeat_byte(0xcd);
    let beneficiary = Address::repeat_byte(0xbe);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(10).pow(18.into())).unwrap();
    vm.install_contract(
        contract,
        &ops_to_bytecode(&[push_address(beneficiary), Operation::SelfDestruct]),
    )
    .unwrap();
    vm.state.set_balance(contract, U256::from(100)).unwrap();

    let tx = signed_transfer(
        5,
        0,
        TxKind::Call(contract),
        U256::zero(),
        100_000,
        Bytes::new(),
    );
    let (_, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();
    assert!(report.is_success());

    // The account is gone and its balance moved to the beneficiary.
    assert!(!vm.state.account_exists(contract).unwrap());
    assert_eq!(vm.state.get_balance(beneficiary).unwrap(), U256::from(100));

    // 21000 + PUSH20 + SELFDESTRUCT(0): the 24000 refund is capped at half.
    let gross = 21_000 + 3;
    assert_eq!(report.gas_refunded, gross / 2);
    assert_eq!(report.gas_used, gross - gross / 2);
}

#[test]
fn selfdestructed_contract_stays_callable_within_the_transaction() {
    let key = test_secret_key(6);
    let sender = address_of(&key);
    let victim = Address::repeat_byte(0xcd);
    let driver = Address::repeat_byte(0xdf);
    let beneficiary = Address::repeat_byte(0xbe);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(10).pow(18.into())).unwrap();
    vm.install_contract(
        victim,
        &ops_to_bytecode(&[push_address(beneficiary), Operation::SelfDestruct]),
    )
    .unwrap();
    // The driver calls the victim twice in one transaction.
    let call_victim = [
        push1(0),
        push1(0),
        push1(0),
        push1(0),
        push1(0),
        push_address(victim),
        Operation::Push((3, U256::from(30_000))),
        Operation::Call,
    ];
    let mut driver_ops = Vec::new();
    driver_ops.extend(call_victim.clone());
    driver_ops.extend(call_victim);
    driver_ops.push(Operation::Stop);
    vm.install_contract(driver, &ops_to_bytecode(&driver_ops)).unwrap();

    let tx = signed_transfer(
        6,
        0,
        TxKind::Call(driver),
        U256::zero(),
        200_000,
        Bytes::new(),
    );
    let (_, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();
    assert!(report.is_success());
    // Both calls ran the still-present code; the deletion is deduplicated,
    // so the refund counts one account.
    assert!(!vm.state.account_exists(victim).unwrap());
    let gross = report.gas_used + report.gas_refunded;
    assert_eq!(report.gas_refunded, 24_000.min(gross / 2));
}

#[test]
fn gas_is_monotonic_when_not_the_binding_constraint() {
    let contract = Address::repeat_byte(0xcc);
    let code = ops_to_bytecode(&[
        push1(42),
        push1(0),
        Operation::Sstore,
        push1(1),
        push1(1),
        Operation::Sstore,
        Operation::Stop,
    ]);

    let mut roots = Vec::new();
    for gas in [100_000u64, 100_001] {
        let key = test_secret_key(7);
        let sender = address_of(&key);
        let mut vm = TestVm::new();
        vm.fund(sender, U256::from(10).pow(18.into())).unwrap();
        vm.install_contract(contract, &code).unwrap();
        let tx = signed_transfer(7, 0, TxKind::Call(contract), U256::zero(), gas, Bytes::new());
        let (receipt, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();
        assert!(report.is_success());
        roots.push((report.gas_used, receipt.state_root));
    }
    // Same gas usage and, fees aside, the same storage effects.
    assert_eq!(roots[0].0, roots[1].0);
}

#[test]
fn failed_top_level_frame_still_pays_fees_and_bumps_the_nonce() {
    let key = test_secret_key(8);
    let sender = address_of(&key);
    let contract = Address::repeat_byte(0xcc);

    let mut vm = TestVm::new();
    let initial = U256::from(10).pow(18.into());
    vm.fund(sender, initial).unwrap();
    // Store something, then fail: the whole frame burns.
    vm.install_contract(
        contract,
        &ops_to_bytecode(&[push1(9), push1(0), Operation::Sstore, Operation::Jump]),
    )
    .unwrap();

    let tx = signed_transfer(
        8,
        0,
        TxKind::Call(contract),
        U256::zero(),
        50_000,
        Bytes::new(),
    );
    let (receipt, report) = vm.execute_transaction(&tx, Fork::Frontier).unwrap();

    assert!(!report.is_success());
    // All gas is consumed, the nonce moved, no logs or storage survive.
    assert_eq!(report.gas_used, 50_000);
    assert_eq!(vm.state.get_nonce(sender).unwrap(), 1);
    assert_eq!(vm.state.get_balance(sender).unwrap(), initial - 50_000);
    assert_eq!(
        vm.state.get_balance(vm.block.coinbase).unwrap(),
        U256::from(50_000)
    );
    assert_eq!(
        vm.state.get_storage(contract, U256::zero()).unwrap(),
        U256::zero()
    );
    assert!(receipt.logs.is_empty());
}

#[test]
fn validation_rejects_without_state_changes() {
    let key = test_secret_key(9);
    let sender = address_of(&key);
    let recipient = Address::repeat_byte(0xbb);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(100_000)).unwrap();
    let root_before = vm.state.state_root();

    // Wrong nonce.
    let tx = signed_transfer(9, 5, TxKind::Call(recipient), U256::zero(), 21_000, Bytes::new());
    let err = vm.execute_transaction(&tx, Fork::Frontier).unwrap_err();
    assert!(matches!(
        err,
        ethrun_vm::ExecutionError::InvalidTransaction(InvalidTransaction::NonceMismatch {
            expected: 0,
            got: 5
        })
    ));

    // Intrinsic gas above the limit.
    let tx = signed_transfer(9, 0, TxKind::Call(recipient), U256::zero(), 20_000, Bytes::new());
    assert!(matches!(
        vm.execute_transaction(&tx, Fork::Frontier).unwrap_err(),
        ethrun_vm::ExecutionError::InvalidTransaction(
            InvalidTransaction::IntrinsicGasTooLow { .. }
        )
    ));

    // Upfront cost above the balance.
    let tx = signed_transfer(
        9,
        0,
        TxKind::Call(recipient),
        U256::from(1_000_000),
        21_000,
        Bytes::new(),
    );
    assert!(matches!(
        vm.execute_transaction(&tx, Fork::Frontier).unwrap_err(),
        ethrun_vm::ExecutionError::InvalidTransaction(
            InvalidTransaction::InsufficientAccountFunds { .. }
        )
    ));

    // Transaction gas above what the block has left.
    vm.block.gas_limit = 20_000;
    let tx = signed_transfer(9, 0, TxKind::Call(recipient), U256::zero(), 21_000, Bytes::new());
    assert!(matches!(
        vm.execute_transaction(&tx, Fork::Frontier).unwrap_err(),
        ethrun_vm::ExecutionError::InvalidTransaction(
            InvalidTransaction::BlockGasLimitReached { .. }
        )
    ));
    vm.block.gas_limit = 10_000_000;

    // Nothing ran, nothing changed.
    assert_eq!(vm.state.state_root(), root_before);
    assert_eq!(vm.state.get_nonce(sender).unwrap(), 0);
}

#[test]
fn homestead_rejects_high_s_signatures() {
    let key = test_secret_key(10);
    let sender = address_of(&key);
    let recipient = Address::repeat_byte(0xbb);

    let mut vm = TestVm::new();
    vm.fund(sender, U256::from(10).pow(18.into())).unwrap();

    // Flip a valid signature into its high-s twin; it still recovers (to
    // some address) but Homestead refuses it outright.
    let mut tx = signed_transfer(10, 0, TxKind::Call(recipient), U256::zero(), 21_000, Bytes::new());
    tx.s = *SECP256K1_ORDER - tx.s;
    tx.v = if tx.v == 27 { 28 } else { 27 };
    assert!(tx.sender().is_ok());
    assert!(!tx.has_low_s());

    assert!(matches!(
        vm.execute_transaction(&tx, Fork::Homestead).unwrap_err(),
        ethrun_vm::ExecutionError::InvalidTransaction(InvalidTransaction::SignatureHighS)
    ));
}

#[test]
fn receipts_accumulate_gas_across_transactions() {
    let key = test_secret_key(11);
    let sender = address_of(&key);
    let recipient = Address::repeat_byte(0xbb);

    let mut state = ethrun_storage::WorldState::new(std::sync::Arc::new(
        ethrun_storage::InMemoryKv::new(),
    ));
    state.set_balance(sender, U256::from(10).pow(18.into())).unwrap();
    let mut vm = ethrun_vm::Vm::new(
        &mut state,
        ethrun_vm::utils::test_block_context(),
        ethrun_vm::rules_for_fork(Fork::Frontier),
    );

    for nonce in 0..3u64 {
        let tx = signed_transfer(
            11,
            nonce,
            TxKind::Call(recipient),
            U256::from(1),
            21_000,
            Bytes::new(),
        );
        let (receipt, _) = vm.execute_transaction(&tx).unwrap();
        assert_eq!(receipt.cumulative_gas_used, (nonce + 1) * 21_000);
    }
    assert_eq!(vm.block_gas_used(), 63_000);
}

#[test]
fn genesis_fixture_roundtrips_through_the_pipeline() {
    let json = r#"{
        "config": { "chainId": 1, "homesteadBlock": 0 },
        "alloc": {
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa": { "balance": "1000000000000000000" }
        },
        "difficulty": "0x20000",
        "gasLimit": "0x989680",
        "timestamp": "0"
    }"#;
    let state = ethrun_vm::utils::genesis_state(json).unwrap();
    assert_eq!(
        state.get_balance(Address::repeat_byte(0xaa)).unwrap(),
        U256::from(10).pow(18.into())
    );
    assert_ne!(state.state_root(), *EMPTY_TRIE_ROOT);
}
