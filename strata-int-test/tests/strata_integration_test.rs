mod messenger;
mod migration;
mod store;

#[ctor::ctor]
fn init() {
    colog::init();
}
