fn main() {
    calc_snip_lib::run()
}
