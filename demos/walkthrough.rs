use segalloc::Heap;

/// Waits until the user presses ENTER. Useful when you want to inspect
/// memory state with tools like `pmap`, `htop`, `gdb`, or just visually
/// track how allocations change the program break between steps.
fn block_until_enter_pressed() {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().read_line(&mut String::new());
}

fn main() {
    env_logger::init();

    let mut heap = Heap::new();
    if !heap.init() {
        eprintln!("failed to initialize heap: memory provider refused the initial request");
        std::process::exit(1);
    }
    println!("[init] heap initialized");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Allocate a handful of small blocks.
    // --------------------------------------------------------------------
    println!("\n[1] Allocate a, b, c (48 bytes each)");
    let a = heap.allocate(48);
    let b = heap.allocate(48);
    let c = heap.allocate(48);
    println!("    a = {a:?}\n    b = {b:?}\n    c = {c:?}");
    assert!(heap.check(), "heap invariants hold after three allocations");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Free the middle block and watch it sit in its own free-list bucket
    //    until a neighbour joins it.
    // --------------------------------------------------------------------
    println!("\n[2] Free b (the middle block)");
    heap.free(b);
    assert!(heap.check(), "freeing a middle block never breaks the boundary tags");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Free a and c too; everything should coalesce into one free run.
    // --------------------------------------------------------------------
    println!("\n[3] Free a and c");
    heap.free(a);
    heap.free(c);
    assert!(heap.check(), "a, b, and c have fully coalesced");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Shrink-in-place and grow-by-copy resize paths.
    // --------------------------------------------------------------------
    println!("\n[4] Allocate d (64 bytes), shrink it to 32, then grow it to 256");
    let d = heap.allocate(64);
    unsafe {
        std::ptr::write_bytes(d, 0xAB, 64);
    }
    let d = heap.resize(d, 32);
    println!("    shrink-in-place kept the same pointer: {d:?}");
    let d = heap.resize(d, 256);
    println!("    grow-by-copy returned: {d:?}");
    unsafe {
        assert_eq!(*d, 0xAB, "resize preserves the original bytes");
    }
    assert!(heap.check());
    block_until_enter_pressed();

    println!("\n[5] End of walkthrough. Process exit reclaims the whole heap.");
}
