fn main() {
    mindgames_lib::run()
}
